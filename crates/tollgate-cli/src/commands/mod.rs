//! CLI command definitions and dispatch.

pub mod migrate;
pub mod session;
pub mod tenant;
pub mod user;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use tollgate_auth::{AuthServices, Stores};
use tollgate_core::AppError;
use tollgate_core::config::AppConfig;
use tollgate_database::DatabasePool;

use crate::output::OutputFormat;

/// Tollgate: multi-tenant session authority administration
#[derive(Debug, Parser)]
#[command(name = "tollgate", version, about, long_about = None)]
pub struct Cli {
    /// Base configuration file, without extension
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Environment overlay loaded from `config/{env}`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Tenant management
    Tenant(tenant::TenantArgs),
    /// Session inspection and revocation
    Session(session::SessionArgs),
    /// User role management
    User(user::UserArgs),
}

impl Cli {
    /// Execute the selected command.
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load_from(&self.config, &self.env)?;
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Tenant(args) => tenant::execute(args, &config, self.format).await,
            Commands::Session(args) => session::execute(args, &config, self.format).await,
            Commands::User(args) => user::execute(args, &config, self.format).await,
        }
    }
}

/// Connect to the database and build the session services over it.
pub async fn connect_services(config: &AppConfig) -> Result<AuthServices, AppError> {
    let pool = DatabasePool::connect(&config.database).await?;
    tracing::debug!("Building session services for CLI command");
    AuthServices::builder(config.clone(), Stores::postgres(pool.repositories())).build()
}

/// Parse a UUID argument.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|e| AppError::validation(format!("Invalid {what} ID: {e}")))
}
