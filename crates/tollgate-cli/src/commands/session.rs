//! Session inspection and revocation commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use tollgate_auth::SessionSummary;
use tollgate_core::AppError;
use tollgate_core::config::AppConfig;

use super::{connect_services, parse_id};
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// List live sessions of a tenant, or of one user in it
    List {
        /// Tenant ID
        tenant: String,
        /// Only this user's sessions
        #[arg(long)]
        user: Option<String>,
    },
    /// Revoke one session
    Revoke {
        /// Tenant ID
        tenant: String,
        /// Session ID
        id: String,
    },
    /// Revoke every session of a user
    RevokeUser {
        /// Tenant ID
        tenant: String,
        /// User ID
        user: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Revoke every session of a tenant
    RevokeTenant {
        /// Tenant ID
        tenant: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Delete expired sessions and reset tokens now
    Cleanup,
}

#[derive(Debug, Serialize, Tabled)]
struct SessionRow {
    id: String,
    user_id: String,
    ip: String,
    device: String,
    created: String,
    last_active: String,
    expires: String,
}

impl From<SessionSummary> for SessionRow {
    fn from(s: SessionSummary) -> Self {
        let fmt = |t: chrono::DateTime<chrono::Utc>| t.format("%Y-%m-%d %H:%M:%S").to_string();
        Self {
            id: s.id.to_string(),
            user_id: s.user_id.to_string(),
            ip: s.ip_address.unwrap_or_else(|| "-".to_string()),
            device: s.device_fingerprint.unwrap_or_else(|| "-".to_string()),
            created: fmt(s.created_at),
            last_active: s.last_active_at.map(fmt).unwrap_or_else(|| "-".to_string()),
            expires: fmt(s.expires_at),
        }
    }
}

pub async fn execute(
    args: &SessionArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = connect_services(config).await?;

    match &args.command {
        SessionCommand::List { tenant, user } => {
            let tenant_id = parse_id(tenant, "tenant")?;
            let summaries = match user {
                Some(user) => {
                    let user_id = parse_id(user, "user")?;
                    services
                        .sessions
                        .list_sessions(tenant_id, user_id, None)
                        .await?
                }
                None => {
                    let now = chrono::Utc::now();
                    services
                        .session_store
                        .list_for_tenant(tenant_id)
                        .await?
                        .into_iter()
                        .filter(|s| !s.is_expired_at(now))
                        .map(|s| SessionSummary::from_session(s, None))
                        .collect()
                }
            };
            let rows: Vec<SessionRow> = summaries.into_iter().map(SessionRow::from).collect();
            output::print_list(&rows, format);
        }
        SessionCommand::Revoke { tenant, id } => {
            let tenant_id = parse_id(tenant, "tenant")?;
            let session_id = parse_id(id, "session")?;
            services
                .revocation
                .revoke_session(tenant_id, session_id, None)
                .await?;
            output::print_success(&format!("Session {session_id} revoked"));
        }
        SessionCommand::RevokeUser {
            tenant,
            user,
            force,
        } => {
            let tenant_id = parse_id(tenant, "tenant")?;
            let user_id = parse_id(user, "user")?;
            if !output::confirm(&format!("Revoke all sessions of user {user_id}?"), *force)? {
                return Ok(());
            }
            let count = services
                .revocation
                .revoke_user(tenant_id, user_id, None)
                .await?;
            output::print_success(&format!("Revoked {count} sessions"));
        }
        SessionCommand::RevokeTenant { tenant, force } => {
            let tenant_id = parse_id(tenant, "tenant")?;
            let prompt = format!("Revoke ALL sessions of tenant {tenant_id}?");
            if !output::confirm(&prompt, *force)? {
                return Ok(());
            }
            let count = services.revocation.revoke_tenant(tenant_id, None).await?;
            output::print_success(&format!("Revoked {count} sessions"));
        }
        SessionCommand::Cleanup => {
            let report = services.cleanup.sweep().await?;
            output::print_item(&report, format);
        }
    }

    Ok(())
}
