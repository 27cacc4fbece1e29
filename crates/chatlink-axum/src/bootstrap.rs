//! Axum server bootstrap - the composition root.
//!
//! This module is the only place where the session slot, configuration and
//! listener are wired together for the web adapter.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use chatlink_core::{SessionConfig, StopOutcome};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::sse::SessionSlot;
use crate::state::AppState;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 9870;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port for the HTTP server. `0` picks a free port.
    pub port: u16,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// Settings applied to every client session.
    pub session: SessionConfig,
}

impl ServerConfig {
    /// Loopback on the default port with default session timing.
    pub fn with_defaults() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            cors: CorsConfig::default(),
            session: SessionConfig::default(),
        }
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }

    /// Replace the session settings.
    #[must_use]
    pub const fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// `host:port` string passed to the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Application context for the Axum adapter.
#[derive(Debug)]
pub struct AxumContext {
    /// Holder of the single connected client's session.
    pub slot: SessionSlot,
    /// Configuration the context was built from.
    pub config: ServerConfig,
    /// Cancelled to stop the server and every open stream.
    pub shutdown: CancellationToken,
}

/// Validate the configuration and build the application context.
pub fn bootstrap(config: ServerConfig, shutdown: CancellationToken) -> Result<AxumContext> {
    config
        .session
        .validate()
        .context("Invalid session configuration")?;

    info!(
        host = %config.host,
        port = config.port,
        cors = ?config.cors,
        stop_timeout_ms = config.session.stop_timeout.as_millis(),
        stop_poll_interval_ms = config.session.stop_poll_interval.as_millis(),
        keep_alive_secs = config.session.keep_alive.map(|d| d.as_secs()),
        "Axum bootstrap"
    );

    let slot = SessionSlot::new(shutdown.clone(), config.session);
    Ok(AxumContext {
        slot,
        config,
        shutdown,
    })
}

/// Bind the configured address and serve until the shutdown token fires.
pub async fn start_server(state: AppState) -> Result<()> {
    let listener = TcpListener::bind(state.config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", state.config.bind_addr()))?;
    serve(listener, state).await
}

/// Serve on a pre-bound listener until the shutdown token fires.
///
/// Open event streams are ended by the same token, so graceful shutdown
/// does not wait on them. The active session, if any, is stopped before
/// returning.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr: SocketAddr = listener.local_addr()?;
    info!("chatlink server listening on http://{addr}");
    info!("Clients subscribe at http://{addr}/api/events");

    let app = crate::routes::create_router(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(state.shutdown.clone().cancelled_owned())
        .await?;

    if state.slot.shutdown().await == Some(StopOutcome::TimedOut) {
        warn!("Client session did not stop within the graceful window");
    }
    info!("chatlink server shut down");
    Ok(())
}
