//! Tenant management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::json;
use tabled::Tabled;

use tollgate_core::AppError;
use tollgate_core::config::AppConfig;
use tollgate_entity::tenant::{CreateTenant, SessionPolicyOverrides, TenantStatus};

use super::{connect_services, parse_id};
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct TenantArgs {
    #[command(subcommand)]
    pub command: TenantCommand,
}

#[derive(Debug, Subcommand)]
pub enum TenantCommand {
    /// Create a tenant
    Create {
        /// URL-safe slug
        slug: String,
        /// Display name (defaults to the slug)
        #[arg(long)]
        name: Option<String>,
        /// Initial status: active, trial, suspended, disabled
        #[arg(long, default_value = "active")]
        status: String,
    },
    /// List tenants
    List,
    /// Show a tenant's effective session policy
    Policy {
        /// Tenant ID
        id: String,
    },
    /// Replace a tenant's session policy overrides with a JSON object
    SetPolicy {
        /// Tenant ID
        id: String,
        /// e.g. '{"idleTimeoutMinutes": 30, "sessionBindingMode": "ip"}'
        overrides: String,
    },
    /// Change a tenant's status
    SetStatus {
        /// Tenant ID
        id: String,
        /// New status: active, trial, suspended, disabled
        status: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Suspend a tenant and delete all of its sessions
    Suspend {
        /// Tenant ID
        id: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct TenantRow {
    id: String,
    slug: String,
    name: String,
    status: String,
    created: String,
}

pub async fn execute(
    args: &TenantArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = connect_services(config).await?;
    let tenants = &services.tenants;

    match &args.command {
        TenantCommand::Create { slug, name, status } => {
            let status: TenantStatus = status.parse()?;
            let tenant = tenants
                .create(&CreateTenant {
                    slug: slug.clone(),
                    name: name.clone().unwrap_or_else(|| slug.clone()),
                    status,
                    settings: json!({}),
                })
                .await?;
            output::print_success(&format!("Tenant '{}' created", tenant.slug));
            output::print_item(&tenant, format);
        }
        TenantCommand::List => {
            let rows: Vec<TenantRow> = tenants
                .list()
                .await?
                .into_iter()
                .map(|t| TenantRow {
                    id: t.id.to_string(),
                    slug: t.slug,
                    name: t.name,
                    status: t.status.to_string(),
                    created: t.created_at.format("%Y-%m-%d %H:%M").to_string(),
                })
                .collect();
            output::print_list(&rows, format);
        }
        TenantCommand::Policy { id } => {
            let tenant = tenants.resolve(Some(parse_id(id, "tenant")?)).await?;
            let policy = services.policy.resolve_for_tenant(&tenant);
            output::print_item(&policy, format);
        }
        TenantCommand::SetPolicy { id, overrides } => {
            let tenant_id = parse_id(id, "tenant")?;
            let overrides: SessionPolicyOverrides = serde_json::from_str(overrides)?;
            let tenant = tenants.update_overrides(tenant_id, &overrides).await?;
            output::print_success(&format!("Session policy of '{}' updated", tenant.slug));
            output::print_item(&services.policy.resolve_for_tenant(&tenant), format);
        }
        TenantCommand::SetStatus { id, status, force } => {
            let tenant_id = parse_id(id, "tenant")?;
            let status: TenantStatus = status.parse()?;
            let prompt = format!("Set tenant {tenant_id} to '{status}'?");
            if !output::confirm(&prompt, *force)? {
                return Ok(());
            }
            let revoked = tenants.set_status(tenant_id, status).await?;
            output::print_success(&format!(
                "Tenant {tenant_id} is now '{status}' ({} sessions revoked)",
                revoked.len()
            ));
        }
        TenantCommand::Suspend { id, force } => {
            let tenant_id = parse_id(id, "tenant")?;
            let prompt = format!("Suspend tenant {tenant_id} and delete all of its sessions?");
            if !output::confirm(&prompt, *force)? {
                return Ok(());
            }
            let revoked = tenants.suspend(tenant_id).await?;
            output::print_success(&format!(
                "Tenant {tenant_id} suspended ({} sessions revoked)",
                revoked.len()
            ));
        }
    }

    Ok(())
}
