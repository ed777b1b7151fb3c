//! Endpoint and session configuration.

use std::time::Duration;

use crate::error::{Error, Result};

/// Resource path used for the WebSocket upgrade when none is configured.
pub const DEFAULT_RESOURCE_PATH: &str = "/market/tickers";

/// Fixed delay between a failure and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Upper bound on the best-effort graceful close during teardown.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Remote host and port a session connects to.
///
/// Immutable once built; every reconnect reuses it verbatim. The port may be
/// numeric or one of the well-known service names `https`, `wss`, `http` and
/// `ws`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: String,
}

impl Endpoint {
    /// Create an endpoint from a host name and a port or service name.
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
        }
    }

    /// Host name, also used for TLS SNI and the `Host` header.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port exactly as supplied.
    #[must_use]
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Numeric port, mapping well-known service names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolve`] if the port is neither a number nor a known
    /// service name.
    pub fn port_number(&self) -> Result<u16> {
        match self.port.as_str() {
            "https" | "wss" => Ok(443),
            "http" | "ws" => Ok(80),
            other => other
                .parse()
                .map_err(|_| Error::Resolve(format!("unknown port or service: {other}"))),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Size limits forwarded to the WebSocket layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum size of a complete inbound message in bytes.
    ///
    /// Default: 16 MB
    pub max_message_size: usize,

    /// Maximum size of a single inbound frame in bytes.
    ///
    /// Default: 4 MB
    pub max_frame_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_message_size: 16 * 1024 * 1024, // 16 MB
            max_frame_size: 4 * 1024 * 1024,    // 4 MB
        }
    }
}

impl Limits {
    /// Create limits with custom values.
    #[must_use]
    pub const fn new(max_message_size: usize, max_frame_size: usize) -> Self {
        Self {
            max_message_size,
            max_frame_size,
        }
    }
}

/// How inbound text is recognised as a keep-alive ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PingMatch {
    /// Parse the payload as JSON and look for a top-level ping key.
    #[default]
    Structured,
    /// Any payload containing the ping key is a ping; the value is the text
    /// after the first `:`.
    ///
    /// Matches unrelated payloads that merely mention the key. Only use it
    /// against feeds known never to nest the key elsewhere.
    Substring,
}

/// Keep-alive ping/pong settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingConfig {
    /// Field name marking a ping. Default: `ping`
    pub key: String,
    /// Field name used in the reply. Default: `pong`
    pub reply_key: String,
    /// Detection mode. Default: [`PingMatch::Structured`]
    pub matching: PingMatch,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            key: "ping".to_string(),
            reply_key: "pong".to_string(),
            matching: PingMatch::Structured,
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Path requested in the WebSocket upgrade.
    ///
    /// Default: `/market/tickers`
    pub resource_path: String,

    /// Delay before every reconnect attempt. Never grows.
    ///
    /// Default: 3000 ms
    pub reconnect_delay: Duration,

    /// Give up after this many consecutive failed attempts.
    ///
    /// `None` retries forever.
    /// Default: None
    pub max_reconnect_attempts: Option<u32>,

    /// Bound on the graceful close performed during teardown.
    ///
    /// Default: 1 second
    pub close_timeout: Duration,

    /// Ping detection and reply format.
    pub ping: PingConfig,

    /// Inbound size limits.
    pub limits: Limits,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            resource_path: DEFAULT_RESOURCE_PATH.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_reconnect_attempts: None,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            ping: PingConfig::default(),
            limits: Limits::default(),
        }
    }
}

impl SessionConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the upgrade resource path.
    #[must_use]
    pub fn with_resource_path(mut self, path: impl Into<String>) -> Self {
        self.resource_path = path.into();
        self
    }

    /// Set the fixed reconnect delay.
    #[must_use]
    pub const fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Cap consecutive failed connection attempts. Must be at least 1.
    #[must_use]
    pub const fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = Some(attempts);
        self
    }

    /// Set the graceful close bound.
    #[must_use]
    pub const fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Set ping detection and reply format.
    #[must_use]
    pub fn with_ping(mut self, ping: PingConfig) -> Self {
        self.ping = ping;
        self
    }

    /// Switch ping detection mode, keeping the keys.
    #[must_use]
    pub fn with_ping_match(mut self, matching: PingMatch) -> Self {
        self.ping.matching = matching;
        self
    }

    /// Set inbound size limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Check that the configuration can drive a session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a resource path that does not
    /// start with `/`, an empty ping key or reply key, a zero retry cap, or a
    /// zero limit.
    pub fn validate(&self) -> Result<()> {
        if !self.resource_path.starts_with('/') {
            return Err(Error::InvalidConfig(format!(
                "resource path must start with '/': {:?}",
                self.resource_path
            )));
        }
        if self.resource_path.chars().any(char::is_whitespace) {
            return Err(Error::InvalidConfig(format!(
                "resource path contains whitespace: {:?}",
                self.resource_path
            )));
        }
        if self.ping.key.is_empty() || self.ping.reply_key.is_empty() {
            return Err(Error::InvalidConfig("ping keys must not be empty".into()));
        }
        if self.max_reconnect_attempts == Some(0) {
            return Err(Error::InvalidConfig(
                "max reconnect attempts must be at least 1".into(),
            ));
        }
        if self.limits.max_message_size == 0 || self.limits.max_frame_size == 0 {
            return Err(Error::InvalidConfig("limits must be non-zero".into()));
        }
        Ok(())
    }
}
