//! `chatlink-server` entry point - the composition root.

use std::sync::Arc;

use anyhow::Result;
use chatlink_axum::{Cli, bootstrap, spawn_stdin_producer, start_server};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let shutdown = CancellationToken::new();
    let ctx = Arc::new(bootstrap(cli.server_config(), shutdown.clone())?);

    if cli.stdin {
        info!(sender = %cli.sender, "Forwarding stdin lines as chat messages");
        drop(spawn_stdin_producer(
            Box::new(ctx.slot.clone()),
            cli.sender.clone(),
            shutdown.clone(),
        ));
    }

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
            info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    start_server(ctx).await
}
