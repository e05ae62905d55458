//! tiledl - command-line client for the MBTiles download service

mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tilejob::ClientConfig;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = ClientConfig::from_env()?;
    cli.apply(&mut cfg);

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => on_signal.cancel(),
            Err(e) => warn!("ctrl-c handler failed: {e}"),
        }
    });

    match cli.command {
        Command::Estimate(args) => commands::run_estimate(&args, &cfg.estimator),
        Command::Download(args) => commands::run_download(args, &cfg, shutdown).await,
        Command::Status { session_id } => commands::run_status(session_id, &cfg).await,
        Command::Health => commands::run_health(&cfg).await,
        Command::Sources => commands::run_sources(&cfg).await,
        Command::Fetch { file_name, out } => commands::run_fetch(file_name, out, &cfg).await,
        Command::Cleanup { session_id } => commands::run_cleanup(session_id, &cfg).await,
    }
}
