//! Command-line interface for the `chatlink-server` binary.

use std::time::Duration;

use chatlink_core::{DEFAULT_STOP_POLL_INTERVAL, SessionConfig};
use clap::Parser;

use crate::bootstrap::{DEFAULT_PORT, ServerConfig};

/// Serve a single-client push stream of chat events over SSE.
#[derive(Debug, Parser)]
#[command(name = "chatlink-server")]
#[command(about = "Stream chat events to a connected client over SSE")]
#[command(version)]
pub struct Cli {
    /// Interface to bind
    #[arg(long, env = "CHATLINK_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "CHATLINK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Allow only this CORS origin (repeatable). All origins when omitted.
    #[arg(long = "allowed-origin", value_name = "ORIGIN")]
    pub allowed_origins: Vec<String>,

    /// Upper bound for a graceful stop, in milliseconds
    #[arg(long, env = "CHATLINK_STOP_TIMEOUT_MS", default_value_t = 1000)]
    pub stop_timeout_ms: u64,

    /// Send a keep-alive comment after this many idle seconds (0 disables)
    #[arg(long, env = "CHATLINK_KEEP_ALIVE_SECS", default_value_t = 15)]
    pub keep_alive_secs: u64,

    /// Read lines from stdin and forward them as chat messages
    #[arg(long)]
    pub stdin: bool,

    /// Sender name for messages read from stdin
    #[arg(long, default_value = "host")]
    pub sender: String,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Session settings derived from the timing flags.
    pub fn session_config(&self) -> SessionConfig {
        let stop_timeout = Duration::from_millis(self.stop_timeout_ms);
        let mut session = SessionConfig::default()
            .with_stop_timeout(stop_timeout)
            .with_stop_poll_interval(DEFAULT_STOP_POLL_INTERVAL.min(stop_timeout));
        if self.keep_alive_secs > 0 {
            session = session.with_keep_alive(Duration::from_secs(self.keep_alive_secs));
        }
        session
    }

    /// Server configuration for these arguments.
    pub fn server_config(&self) -> ServerConfig {
        let mut config = ServerConfig {
            host: self.host.clone(),
            port: self.port,
            ..ServerConfig::with_defaults()
        }
        .with_session(self.session_config());
        if !self.allowed_origins.is_empty() {
            config = config.with_allowed_origins(self.allowed_origins.clone());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::CorsConfig;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["chatlink-server"]);
        let config = cli.server_config();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.cors, CorsConfig::AllowAll);
        assert_eq!(config.session.stop_timeout, Duration::from_secs(1));
        assert_eq!(config.session.stop_poll_interval, DEFAULT_STOP_POLL_INTERVAL);
        assert_eq!(config.session.keep_alive, Some(Duration::from_secs(15)));
        assert!(!cli.stdin);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "chatlink-server",
            "--port",
            "0",
            "--allowed-origin",
            "http://a.test",
            "--allowed-origin",
            "http://b.test",
            "--stop-timeout-ms",
            "50",
            "--keep-alive-secs",
            "0",
            "--stdin",
            "--sender",
            "ops",
            "-v",
        ]);
        assert!(cli.stdin && cli.verbose);
        assert_eq!(cli.sender, "ops");

        let config = cli.server_config();
        assert_eq!(config.port, 0);
        assert_eq!(
            config.cors,
            CorsConfig::AllowOrigins(vec!["http://a.test".into(), "http://b.test".into()])
        );
        assert_eq!(config.session.stop_timeout, Duration::from_millis(50));
        assert_eq!(config.session.stop_poll_interval, Duration::from_millis(50));
        assert_eq!(config.session.keep_alive, None);
        assert!(config.session.validate().is_ok());
    }
}
