//! CORS response headers.
//!
//! The proxy answers any origin with GET only. Headers are attached to every
//! response regardless of outcome, errors included.

use axum::http::{header, HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::CorsConfig;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET";
pub const EXPOSE_HEADERS: &str = "Content-Type, Content-Length, X-Request-Id";

/// Header name and value pairs for `config`.
pub fn cors_headers(config: &CorsConfig) -> Vec<(HeaderName, HeaderValue)> {
    vec![
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN)),
        (header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS)),
        (header::ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static(EXPOSE_HEADERS)),
        (header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(config.max_age_secs)),
    ]
}

/// One overriding layer per CORS header.
pub fn cors_layers(config: &CorsConfig) -> Vec<SetResponseHeaderLayer<HeaderValue>> {
    cors_headers(config)
        .into_iter()
        .map(|(name, value)| SetResponseHeaderLayer::overriding(name, value))
        .collect()
}
