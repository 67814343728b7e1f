//! User role and federated revocation commands.

use clap::{Args, Subcommand};

use tollgate_auth::FederatedIdentity;
use tollgate_core::AppError;
use tollgate_core::config::AppConfig;
use tollgate_entity::user::UserRole;

use super::{connect_services, parse_id};
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Change a user's role
    SetRole {
        /// Tenant ID
        tenant: String,
        /// User ID
        user: String,
        /// New role: owner, admin, member, viewer
        role: String,
    },
    /// Revoke sessions for an identity asserted by an external provider
    RevokeFederated {
        /// Tenant the provider is configured for
        tenant: String,
        /// User ID from the provider
        #[arg(long)]
        user: Option<String>,
        /// Email from the provider
        #[arg(long)]
        email: Option<String>,
    },
}

pub async fn execute(
    args: &UserArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = connect_services(config).await?;

    match &args.command {
        UserCommand::SetRole { tenant, user, role } => {
            let tenant_id = parse_id(tenant, "tenant")?;
            let user_id = parse_id(user, "user")?;
            let role: UserRole = role.parse()?;
            let outcome = services
                .revocation
                .change_role(tenant_id, user_id, role, None)
                .await?;
            output::print_success(&format!("User {user_id} is now '{role}'"));
            output::print_item(&outcome, format);
        }
        UserCommand::RevokeFederated {
            tenant,
            user,
            email,
        } => {
            let identity = FederatedIdentity {
                tenant_id: parse_id(tenant, "tenant")?,
                user_id: user.as_deref().map(|u| parse_id(u, "user")).transpose()?,
                email: email.clone(),
            };
            let outcome = services.revocation.revoke_federated(&identity).await?;
            output::print_item(&outcome, format);
        }
    }

    Ok(())
}
