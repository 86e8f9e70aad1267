//! Runtime configuration of the relay.

use std::time::Duration;

/// Identity service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Full URL of the token verification endpoint.
    pub endpoint: String,
    /// Application identifier sent with every verification.
    pub app_id: String,
    /// Sent as `X-Internal-Auth` when present.
    pub internal_api_key: Option<String>,
    /// Upper bound for one verification round trip.
    pub timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/auth/check-token".to_string(),
            app_id: "desktop_app".to_string(),
            internal_api_key: None,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Per-connection session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long a fresh connection may take to send its handshake frame.
    pub handshake_timeout: Duration,
    /// Close `Active` sessions that stay silent this long. Disabled when `None`.
    pub idle_timeout: Option<Duration>,
    /// Send a WebSocket ping at this interval. Disabled when `None`.
    pub ping_interval: Option<Duration>,
    /// Capacity of each connection's outbound queue.
    pub outbound_buffer: usize,
    /// Re-verify a `token` carried by application messages.
    pub reverify_tokens: bool,
    /// Evict earlier sessions of the same identity when it joins again.
    pub evict_duplicate_identity: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(10),
            idle_timeout: None,
            ping_interval: None,
            outbound_buffer: 256,
            reverify_tokens: false,
            evict_duplicate_identity: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
    pub session: SessionConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
            auth: AuthConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// `0` disables the corresponding timer.
pub fn optional_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
