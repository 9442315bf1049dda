//! Error taxonomy for the proxy pipeline.
//!
//! Variants carry enough context to diagnose a failure from the logs. None of
//! it reaches the caller: the front end only sees the reason kind through
//! [`crate::pipeline::ProxyOutcome`].

use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;

/// Stage of the pipeline a failure was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parse,
    Resolve,
    Classify,
    Fetch,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Resolve => "resolve",
            Stage::Classify => "classify",
            Stage::Fetch => "fetch",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failures of a single proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No target URI was supplied.
    #[error("missing target uri")]
    MissingUri,

    /// The target is not an acceptable absolute http(s) URI.
    #[error("malformed uri {uri:?}: {reason}")]
    MalformedUri { uri: String, reason: String },

    /// The hostname could not be turned into an address.
    #[error("failed to resolve {host}: {message}")]
    ResolutionFailure { host: String, message: String },

    /// The address to be dialed lies in reserved space.
    #[error("{host} resolved to reserved address {ip} ({range})")]
    ReservedAddress {
        host: String,
        ip: IpAddr,
        range: &'static str,
    },

    /// The retrieval did not finish within the fetch deadline.
    #[error("upstream {uri} timed out after {after:?}")]
    UpstreamTimeout { uri: String, after: Duration },

    /// The transport failed or the upstream misbehaved.
    #[error("upstream {uri} failed: {message}")]
    UpstreamError { uri: String, message: String },
}

impl ProxyError {
    pub(crate) fn malformed(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn resolution(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResolutionFailure {
            host: host.into(),
            message: message.into(),
        }
    }

    pub(crate) fn upstream(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamError {
            uri: uri.into(),
            message: message.into(),
        }
    }

    /// The pipeline stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            ProxyError::MissingUri | ProxyError::MalformedUri { .. } => Stage::Parse,
            ProxyError::ResolutionFailure { .. } => Stage::Resolve,
            ProxyError::ReservedAddress { .. } => Stage::Classify,
            ProxyError::UpstreamTimeout { .. } | ProxyError::UpstreamError { .. } => Stage::Fetch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_mapping() {
        assert_eq!(ProxyError::MissingUri.stage(), Stage::Parse);
        assert_eq!(ProxyError::malformed("x", "y").stage(), Stage::Parse);
        assert_eq!(ProxyError::resolution("h", "m").stage(), Stage::Resolve);
        assert_eq!(
            ProxyError::ReservedAddress {
                host: "h".into(),
                ip: "127.0.0.1".parse().unwrap(),
                range: "loopback",
            }
            .stage(),
            Stage::Classify
        );
        assert_eq!(ProxyError::upstream("u", "m").stage(), Stage::Fetch);
    }
}
