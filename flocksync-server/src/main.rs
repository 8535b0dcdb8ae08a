//! flocksync: ChurchSuite to Brevo contact sync.
//!
//! Usage:
//!   flocksync run                 # one sync, JSON summary on stdout
//!   flocksync serve --port 8080   # HTTP trigger at /api/sync
//!
//! Credentials come from the environment or `flocksync.toml`; see
//! `flocksync_sync::config`.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use flocksync_server::{InvocationResponse, build_router, invoke};
use flocksync_sync::SyncConfig;
use std::{path::PathBuf, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "flocksync")]
#[command(about = "Sync ChurchSuite contacts into Brevo")]
struct Args {
    /// Path to a TOML config file (default: ./flocksync.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one sync and print the result as JSON
    Run,
    /// Serve the sync trigger over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Run => run_once(args.config).await,
        Command::Serve { port, bind } => serve(args.config, &bind, port).await,
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run_once(config_path: Option<PathBuf>) -> Result<()> {
    let response = match SyncConfig::load(config_path.as_deref()) {
        Ok(config) => invoke(&config).await,
        Err(e) => InvocationResponse::from_error(&e, false),
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&response).context("Failed to encode response")?
    );

    if !response.is_ok() {
        bail!("sync failed");
    }
    Ok(())
}

async fn serve(config_path: Option<PathBuf>, bind: &str, port: u16) -> Result<()> {
    let config = SyncConfig::load(config_path.as_deref()).context("Failed to load config")?;
    if let Err(e) = config.validate() {
        // Invocations report missing credentials to the caller.
        warn!("{e}");
    }

    let app = build_router(Arc::new(config));
    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("Failed to bind {bind}:{port}"))?;
    info!("Sync trigger listening on http://{}/api/sync", listener.local_addr()?);

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
