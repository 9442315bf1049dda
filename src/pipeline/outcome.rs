//! The single result of a proxied request.

use bytes::Bytes;
use reqwest::header::HeaderValue;

use crate::error::ProxyError;
use crate::upstream::Fetched;

/// Why a request was refused before anything was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingUri,
    MalformedUri,
    ResolutionFailure,
    ReservedAddress,
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::MissingUri => "missing_uri",
            RejectReason::MalformedUri => "malformed_uri",
            RejectReason::ResolutionFailure => "resolution_failure",
            RejectReason::ReservedAddress => "reserved_address",
        }
    }

    /// Caller-facing message. Never mentions addresses or resolver detail.
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::MissingUri => "Missing uri parameter",
            RejectReason::MalformedUri => "Invalid uri",
            RejectReason::ResolutionFailure => "Unable to resolve target host",
            RejectReason::ReservedAddress => "Target address is not allowed",
        }
    }
}

/// Why a permitted fetch did not produce a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamReason {
    Timeout,
    Error,
}

impl UpstreamReason {
    pub fn code(&self) -> &'static str {
        match self {
            UpstreamReason::Timeout => "upstream_timeout",
            UpstreamReason::Error => "upstream_error",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            UpstreamReason::Timeout => "Upstream request timed out",
            UpstreamReason::Error => "Upstream request failed",
        }
    }
}

/// Produced once per request by the pipeline and handed to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyOutcome {
    Success { content_type: HeaderValue, body: Bytes },
    Rejected(RejectReason),
    UpstreamFailure(UpstreamReason),
}

impl ProxyOutcome {
    /// Outcome class label, for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyOutcome::Success { .. } => "success",
            ProxyOutcome::Rejected(_) => "rejected",
            ProxyOutcome::UpstreamFailure(_) => "upstream_failure",
        }
    }

    pub fn reason_code(&self) -> &'static str {
        match self {
            ProxyOutcome::Success { .. } => "ok",
            ProxyOutcome::Rejected(reason) => reason.code(),
            ProxyOutcome::UpstreamFailure(reason) => reason.code(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProxyOutcome::Success { .. })
    }
}

impl From<Result<Fetched, ProxyError>> for ProxyOutcome {
    fn from(result: Result<Fetched, ProxyError>) -> Self {
        match result {
            Ok(Fetched { content_type, body }) => ProxyOutcome::Success { content_type, body },
            Err(ProxyError::MissingUri) => ProxyOutcome::Rejected(RejectReason::MissingUri),
            Err(ProxyError::MalformedUri { .. }) => ProxyOutcome::Rejected(RejectReason::MalformedUri),
            Err(ProxyError::ResolutionFailure { .. }) => ProxyOutcome::Rejected(RejectReason::ResolutionFailure),
            Err(ProxyError::ReservedAddress { .. }) => ProxyOutcome::Rejected(RejectReason::ReservedAddress),
            Err(ProxyError::UpstreamTimeout { .. }) => ProxyOutcome::UpstreamFailure(UpstreamReason::Timeout),
            Err(ProxyError::UpstreamError { .. }) => ProxyOutcome::UpstreamFailure(UpstreamReason::Error),
        }
    }
}
