//! Session timing configuration.
//!
//! Pure configuration values with defaults and validation. Adapters build a
//! [`SessionConfig`] from their own settings sources (CLI flags, env).

use std::time::Duration;

use crate::error::ConfigError;

/// Default sub-interval used while waiting for a stopping session.
pub const DEFAULT_STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default upper bound on the graceful stop wait.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_millis(1000);

/// Timing knobs for a streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Sub-interval of the stop wait. A diagnostic note is logged every time
    /// one elapses without the session finishing.
    pub stop_poll_interval: Duration,

    /// Total time `request_stop` waits before giving up.
    pub stop_timeout: Duration,

    /// Idle interval after which a keep-alive comment frame is written.
    /// `None` disables keep-alive frames.
    pub keep_alive: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stop_poll_interval: DEFAULT_STOP_POLL_INTERVAL,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            keep_alive: None,
        }
    }
}

impl SessionConfig {
    /// Set the graceful stop timeout.
    #[must_use]
    pub const fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Set the stop wait sub-interval.
    #[must_use]
    pub const fn with_stop_poll_interval(mut self, interval: Duration) -> Self {
        self.stop_poll_interval = interval;
        self
    }

    /// Enable keep-alive comment frames at the given idle interval.
    #[must_use]
    pub const fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = Some(interval);
        self
    }

    /// Check that the timing values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stop_poll_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("stop poll interval"));
        }
        if self.stop_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("stop timeout"));
        }
        if self.keep_alive.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ZeroDuration("keep-alive interval"));
        }
        if self.stop_poll_interval > self.stop_timeout {
            return Err(ConfigError::PollExceedsTimeout {
                poll_ms: self.stop_poll_interval.as_millis(),
                timeout_ms: self.stop_timeout.as_millis(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SessionConfig::default();
        assert_eq!(config.stop_timeout, Duration::from_millis(1000));
        assert_eq!(config.stop_poll_interval, Duration::from_millis(100));
        assert!(config.keep_alive.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = SessionConfig::default().with_stop_timeout(Duration::ZERO);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDuration("stop timeout"))
        );
    }

    #[test]
    fn test_zero_keep_alive_rejected() {
        let config = SessionConfig::default().with_keep_alive(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_longer_than_timeout_rejected() {
        let config = SessionConfig::default()
            .with_stop_timeout(Duration::from_millis(50))
            .with_stop_poll_interval(Duration::from_millis(100));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PollExceedsTimeout { .. })
        ));
    }
}
