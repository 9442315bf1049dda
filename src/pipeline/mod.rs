//! Request pipeline.
//!
//! # State Machine
//! ```text
//! Start ──non-empty──▶ Parsed ──parse──▶ Resolved ──lookup──▶ Classified ──allowed──▶ Fetched
//!   │                    │                  │                     │                      │
//!   ▼                    ▼                  ▼                     ▼                      ▼
//! Rejected(Missing)  Rejected(Malformed) Rejected(Resolution) Rejected(Reserved)  UpstreamFailure
//! ```
//!
//! # Design Decisions
//! - One pass per request, nothing retried
//! - Steps compose with `?`; the first failure ends the request
//! - Only the outcome kind leaves the pipeline, details stay in the logs

pub mod outcome;

pub use outcome::{ProxyOutcome, RejectReason, UpstreamReason};

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::guard::{AddressClassifier, DnsResolver, Guard, NameResolver, ReservedRanges, ResolveError, Resolver, UriValidator};
use crate::observability::metrics;
use crate::upstream::{Fetched, HttpTransport, ReqwestTransport, SafeFetcher, TransportSettings};

/// Orchestrates parse → resolve → classify → fetch.
#[derive(Clone)]
pub struct ProxyPipeline {
    guard: Guard,
    fetcher: SafeFetcher,
}

impl ProxyPipeline {
    pub fn new(guard: Guard, fetcher: SafeFetcher) -> Self {
        Self { guard, fetcher }
    }

    /// Assemble a pipeline from configuration and explicit collaborators.
    pub fn with_collaborators(
        config: &ProxyConfig,
        ranges: Arc<ReservedRanges>,
        names: Arc<dyn NameResolver>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let guard = Guard::new(
            UriValidator::new(config.fetch.allowed_schemes.iter().cloned()),
            Resolver::new(names, Duration::from_millis(config.timeouts.dns_ms)),
            AddressClassifier::new(ranges),
        );
        let fetcher = SafeFetcher::new(
            transport,
            guard.clone(),
            Duration::from_millis(config.timeouts.fetch_ms),
            config.fetch.max_redirects,
        );
        Self::new(guard, fetcher)
    }

    /// Production pipeline: system DNS and the reqwest transport.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ResolveError> {
        let names = Arc::new(DnsResolver::from_system_conf()?);
        let transport = Arc::new(ReqwestTransport::new(TransportSettings {
            connect_timeout: Duration::from_millis(config.timeouts.connect_ms),
            max_body_bytes: config.fetch.max_body_bytes,
            user_agent: config.fetch.user_agent.clone(),
        }));
        Ok(Self::with_collaborators(
            config,
            Arc::new(ReservedRanges::standard()),
            names,
            transport,
        ))
    }

    pub fn guard(&self) -> &Guard {
        &self.guard
    }

    /// Run one request through the pipeline.
    pub async fn run(&self, candidate: Option<&str>) -> ProxyOutcome {
        let start = Instant::now();
        let result = self.execute(candidate).await;

        match &result {
            Ok(fetched) => tracing::debug!(
                target_uri = candidate.unwrap_or_default(),
                content_type = ?fetched.content_type,
                bytes = fetched.body.len(),
                "Proxied request"
            ),
            Err(e @ (ProxyError::UpstreamTimeout { .. } | ProxyError::UpstreamError { .. })) => tracing::warn!(
                target_uri = candidate.unwrap_or_default(),
                stage = %e.stage(),
                error = %e,
                "Upstream fetch failed"
            ),
            Err(e) => tracing::info!(
                target_uri = candidate.unwrap_or_default(),
                stage = %e.stage(),
                error = %e,
                "Request rejected"
            ),
        }

        let outcome = ProxyOutcome::from(result);
        metrics::record_outcome(&outcome, start);
        outcome
    }

    async fn execute(&self, candidate: Option<&str>) -> Result<Fetched, ProxyError> {
        let candidate = candidate
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(ProxyError::MissingUri)?;

        let target = self.guard.validator().parse(candidate)?;
        let vetted = self.guard.admit(target).await?;
        self.fetcher.fetch(vetted).await
    }
}
