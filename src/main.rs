//! Tollgate server.
//!
//! Loads configuration, connects to PostgreSQL, applies migrations, wires the
//! session services and runs the expired-row sweep until shutdown.

mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use tollgate_auth::{AuthServices, Stores};
use tollgate_core::config::AppConfig;
use tollgate_core::error::AppError;
use tollgate_database::DatabasePool;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load `TOLLGATE_CONFIG` (default `config/default`) with the `TOLLGATE_ENV` overlay.
fn load_configuration() -> Result<AppConfig, AppError> {
    let base = std::env::var("TOLLGATE_CONFIG").unwrap_or_else(|_| "config/default".to_string());
    let env = std::env::var("TOLLGATE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load_from(&base, &env)
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Tollgate v{}", env!("CARGO_PKG_VERSION"));

    let pool = DatabasePool::connect(&config.database).await?;
    tollgate_database::migration::run_migrations(pool.pool()).await?;

    let sweep_every = Duration::from_secs(
        config
            .session
            .cleanup_interval_minutes
            .max(1)
            .saturating_mul(60),
    );
    let services =
        AuthServices::builder(config, Stores::postgres(pool.repositories())).build()?;

    if let Err(e) = services.cleanup.sweep().await {
        tracing::warn!(error = %e, "Startup sweep failed");
    }

    let mut scheduler = scheduler::SweepScheduler::new().await?;
    scheduler
        .register_sweep(Arc::clone(&services.cleanup), sweep_every)
        .await?;
    scheduler.start().await?;

    tracing::info!("Session authority ready");
    shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    scheduler.shutdown().await?;
    pool.close().await;
    tracing::info!("Tollgate shut down gracefully");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
