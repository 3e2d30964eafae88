//! reservoird: parses a manifest, assembles and starts every reservoir it
//! names, serves the admin HTTP surface, and tears everything down
//! cleanly on SIGINT/SIGTERM.

mod config;
mod construct;
mod error;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use error::{CliError, CliResult};
use reservoir_admin::{build_router, AdminState};
use reservoir_core::manifest::Manifest;
use reservoir_plugin::CompositeRegistry;

#[derive(Parser)]
#[command(name = "reservoird")]
#[command(version, about = "Pluggable stream-processing runtime")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Raise log verbosity to debug.
    #[arg(long, global = true)]
    debug: bool,

    /// Listen address for the admin HTTP surface (default ":5514").
    #[arg(long, global = true)]
    address: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a manifest, start every reservoir it names, and serve the
    /// admin HTTP surface until SIGINT/SIGTERM.
    Run {
        /// Path to the JSON topology manifest.
        config: PathBuf,
    },
    /// Print the framework version and exit.
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Version => {
            println!("reservoird {}", env!("CARGO_PKG_VERSION"));
        }
        Command::Run { config } => {
            if let Err(err) = run(config, cli.address, cli.debug).await {
                tracing::error!(error = %err, "reservoird: fatal error");
                eprintln!("reservoird: {err}");
                std::process::exit(1);
            }
        }
    }
}

/// Manifest names must be unique across the whole file — the map key a
/// duplicate would silently shadow makes this a startup-fatal config error
/// rather than a runtime one.
fn reject_duplicate_reservoir_names(manifest: &Manifest) -> CliResult<()> {
    let mut seen = std::collections::HashSet::new();
    for reservoir in &manifest.reservoirs {
        if !seen.insert(reservoir.name.as_str()) {
            return Err(CliError::Config(format!("duplicate reservoir name '{}'", reservoir.name)));
        }
    }
    Ok(())
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(manifest_path: PathBuf, cli_address: Option<String>, cli_debug: bool) -> CliResult<()> {
    let app_config = AppConfig::assemble(manifest_path, cli_address, cli_debug)?;
    init_logging(app_config.debug);

    tracing::info!(manifest = %app_config.manifest_path.display(), address = %app_config.address, "reservoird: starting");

    let manifest_text = std::fs::read_to_string(&app_config.manifest_path).map_err(|source| CliError::ManifestRead {
        path: app_config.manifest_path.display().to_string(),
        source,
    })?;
    let manifest: Manifest = Manifest::from_json(&manifest_text).map_err(|source| CliError::ManifestParse {
        path: app_config.manifest_path.display().to_string(),
        source,
    })?;
    reject_duplicate_reservoir_names(&manifest)?;

    let registry = CompositeRegistry::with_reference_plugins();
    let reservoirs = construct::build_reservoir_map(&manifest, &registry).await?;

    reservoirs.start_all().await;
    tracing::info!(count = reservoirs.reservoir_count().await, "reservoird: all reservoirs started");

    let poller = reservoir_admin::poller::spawn(reservoirs.clone(), Duration::from_millis(app_config.stats_interval_ms));

    let admin_state = AdminState::new(reservoirs.clone());
    let router = build_router(admin_state);

    let addr = app_config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|source| CliError::Listen {
        address: addr.to_string(),
        source,
    })?;
    tracing::info!(%addr, "reservoird: admin HTTP surface listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|source| CliError::Listen {
            address: addr.to_string(),
            source,
        })?;

    tracing::info!("reservoird: HTTP listener stopped, draining reservoirs");
    poller.abort();
    reservoirs.init_stop_all().await;
    reservoirs.wait_all().await;
    tracing::info!("reservoird: all reservoirs drained, exiting");

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
        (Ok(mut sigint), Ok(mut sigterm)) => {
            tokio::select! {
                _ = sigint.recv() => tracing::info!("reservoird: received SIGINT"),
                _ = sigterm.recv() => tracing::info!("reservoird: received SIGTERM"),
            }
        }
        _ => {
            tracing::warn!("reservoird: failed to install unix signal handlers, falling back to ctrl-c");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("reservoird: received ctrl-c");
}
