//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the SSRF-safe proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Upstream fetch limits.
    pub fetch: FetchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// CORS headers attached to every response.
    pub cors: CorsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for the stages of a request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Wall-clock bound on an upstream fetch, redirects included, in milliseconds.
    pub fetch_ms: u64,

    /// Bound on a single DNS lookup in milliseconds.
    pub dns_ms: u64,

    /// Upstream connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Outer bound on handling an inbound request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            fetch_ms: 10_000,
            dns_ms: 3_000,
            connect_ms: 3_000,
            request_secs: 30,
        }
    }
}

/// Upstream fetch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum redirect hops followed per request.
    pub max_redirects: u8,

    /// Maximum buffered response body in bytes.
    pub max_body_bytes: usize,

    /// User-Agent sent upstream.
    pub user_agent: String,

    /// Schemes a target may use. Only http and https are honored.
    pub allowed_schemes: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_redirects: 10,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            user_agent: concat!("ssrf-proxy/", env!("CARGO_PKG_VERSION")).to_string(),
            allowed_schemes: vec!["http".to_string(), "https".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Attach CORS headers to responses.
    pub enabled: bool,

    /// Value of Access-Control-Max-Age in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age_secs: 1_728_000,
        }
    }
}
