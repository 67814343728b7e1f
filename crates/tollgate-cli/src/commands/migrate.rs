//! Database migration commands.

use clap::{Args, Subcommand};

use tollgate_core::AppError;
use tollgate_core::config::AppConfig;
use tollgate_database::DatabasePool;

use crate::output;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub command: MigrateCommand,
}

#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Apply all pending migrations
    Run,
    /// Check that the database is reachable
    Check,
}

pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> Result<(), AppError> {
    let pool = DatabasePool::connect(&config.database).await?;

    match &args.command {
        MigrateCommand::Run => {
            println!("Running database migrations...");
            tollgate_database::migration::run_migrations(pool.pool()).await?;
            output::print_success("All migrations applied.");
        }
        MigrateCommand::Check => {
            if pool.health_check().await? {
                output::print_success("Database is reachable.");
            } else {
                return Err(AppError::service_unavailable("Database health check failed"));
            }
        }
    }

    pool.close().await;
    Ok(())
}
