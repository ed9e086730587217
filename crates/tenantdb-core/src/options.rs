//! Driver tuning applied when a client is built.

use std::time::Duration;

/// Retry policy for requests the database rejects as throttled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottlingRetryOptions {
    /// How many times a throttled request is retried before failing.
    pub max_retry_attempts_on_throttled_requests: u32,
    /// Upper bound on the total time spent retrying one request.
    pub max_retry_wait_time: Duration,
}

impl Default for ThrottlingRetryOptions {
    fn default() -> Self {
        Self {
            max_retry_attempts_on_throttled_requests: 9,
            max_retry_wait_time: Duration::from_secs(30),
        }
    }
}

impl ThrottlingRetryOptions {
    /// Sets the maximum number of retries.
    #[must_use]
    pub fn with_max_retry_attempts(mut self, attempts: u32) -> Self {
        self.max_retry_attempts_on_throttled_requests = attempts;
        self
    }

    /// Sets the maximum cumulative wait time.
    #[must_use]
    pub fn with_max_retry_wait_time(mut self, wait: Duration) -> Self {
        self.max_retry_wait_time = wait;
        self
    }
}

/// Settings for direct connection mode (talking to storage nodes directly).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectConnectionConfig {
    /// Maximum number of connections opened to a single backend endpoint.
    pub max_connections_per_endpoint: u32,
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// Idle time after which a connection is closed. Zero disables the timeout.
    pub idle_connection_timeout: Duration,
}

impl Default for DirectConnectionConfig {
    fn default() -> Self {
        Self {
            max_connections_per_endpoint: 130,
            connect_timeout: Duration::from_secs(5),
            idle_connection_timeout: Duration::ZERO,
        }
    }
}

impl DirectConnectionConfig {
    /// Sets the per-endpoint connection limit.
    #[must_use]
    pub fn with_max_connections_per_endpoint(mut self, max: u32) -> Self {
        self.max_connections_per_endpoint = max;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the idle connection timeout.
    #[must_use]
    pub fn with_idle_connection_timeout(mut self, timeout: Duration) -> Self {
        self.idle_connection_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_defaults() {
        let options = ThrottlingRetryOptions::default();
        assert_eq!(options.max_retry_attempts_on_throttled_requests, 9);
        assert_eq!(options.max_retry_wait_time, Duration::from_secs(30));
    }

    #[test]
    fn test_direct_mode_override_keeps_other_defaults() {
        let config = DirectConnectionConfig::default().with_max_connections_per_endpoint(10);
        assert_eq!(config.max_connections_per_endpoint, 10);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.idle_connection_timeout, Duration::ZERO);
    }
}
