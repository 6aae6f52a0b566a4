//! Wise task tracking server
//!
//! Runs the JSON API, or one of the maintenance commands.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use wise_tasks::cli::{Cli, Command, admin, report};
use wise_tasks::config::{Config, ConfigLoader, ConfigPaths, EnvOverrides};
use wise_tasks::db::Database;
use wise_tasks::logging::{LogTarget, init_logging};
use wise_tasks::server::{AppState, start_server};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut paths = ConfigPaths::discover();
    if let Some(config_path) = &cli.config {
        paths = paths.with_explicit_file(config_path);
    }
    let mut loader = ConfigLoader::load_with(paths, EnvOverrides::from_env())?;
    for source in loader.sources() {
        info!("Loaded config from {}", source.display());
    }
    cli.apply_overrides(loader.config_mut());
    let config = loader.into_config();

    match &cli.command {
        Some(Command::CreateAdmin(args)) => admin::run_create_admin(&config, args)?,
        Some(Command::Report(args)) => report::run_report(&config, args)?,
        Some(Command::Serve) | None => run_server(config).await?,
    }

    Ok(())
}

/// Run the HTTP API until Ctrl-C.
async fn run_server(config: Config) -> Result<()> {
    info!("Starting Wise task server v{}", env!("CARGO_PKG_VERSION"));

    let db = Database::open(&config.server.db_path)
        .with_context(|| format!("opening database {}", config.server.db_path.display()))?;
    info!("Database: {}", config.server.db_path.display());

    let purged = db.purge_expired_sessions()?;
    if purged > 0 {
        info!("Removed {} expired sessions", purged);
    }
    if db.count_active_admins()? == 0 {
        warn!("No active administrators. Create one with `wise-tasks create-admin`.");
    }

    let addr = tokio::net::lookup_host((config.server.host.as_str(), config.server.port))
        .await?
        .next()
        .with_context(|| format!("cannot resolve host {}", config.server.host))?;

    let state = AppState::new(db, config)?;
    let (shutdown_tx, _bound, handle) = start_server(state, addr).await?;

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C");
    let _ = shutdown_tx.send(());
    handle.await?;

    info!("Server stopped");
    Ok(())
}
