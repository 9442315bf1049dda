//! Bounded, redirect-validating retrieval.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderValue, CONTENT_TYPE, LOCATION};

use crate::error::ProxyError;
use crate::guard::{Guard, VettedTarget};
use crate::observability::metrics;
use crate::upstream::transport::{is_followed_redirect, HttpTransport, UpstreamRequest};

/// Content type relayed when the upstream does not send one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// A fully buffered upstream body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// Upstream `Content-Type`, byte for byte.
    pub content_type: HeaderValue,
    pub body: Bytes,
}

/// Fetches a validated target against its classified address.
#[derive(Clone)]
pub struct SafeFetcher {
    transport: Arc<dyn HttpTransport>,
    guard: Guard,
    timeout: Duration,
    max_redirects: u8,
}

impl SafeFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, guard: Guard, timeout: Duration, max_redirects: u8) -> Self {
        Self {
            transport,
            guard,
            timeout,
            max_redirects,
        }
    }

    /// Retrieve a vetted target, dialing the address it was cleared for.
    ///
    /// The deadline covers every hop. When it expires the in-flight transfer
    /// is dropped and the call fails with `UpstreamTimeout`.
    pub async fn fetch(&self, vetted: VettedTarget) -> Result<Fetched, ProxyError> {
        let uri = vetted.target().as_str().to_string();
        match tokio::time::timeout(self.timeout, self.follow(vetted)).await {
            Ok(result) => result,
            Err(_) => Err(ProxyError::UpstreamTimeout {
                uri,
                after: self.timeout,
            }),
        }
    }

    async fn follow(&self, mut vetted: VettedTarget) -> Result<Fetched, ProxyError> {
        let mut hops = 0u8;

        loop {
            let target = vetted.target();
            let request = UpstreamRequest {
                url: target.url().clone(),
                pin: vetted.pin(),
            };

            let response = self
                .transport
                .get(&request)
                .await
                .map_err(|e| ProxyError::upstream(target.as_str(), e.to_string()))?;

            if !is_followed_redirect(response.status) {
                let content_type = response
                    .headers
                    .get(CONTENT_TYPE)
                    .filter(|v| !v.is_empty())
                    .cloned()
                    .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

                return Ok(Fetched {
                    content_type,
                    body: response.body,
                });
            }

            if hops == self.max_redirects {
                return Err(ProxyError::upstream(
                    target.as_str(),
                    format!("too many redirects (max {})", self.max_redirects),
                ));
            }
            hops += 1;

            let location = response
                .headers
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| ProxyError::upstream(target.as_str(), "redirect without Location header"))?;

            let next = target
                .url()
                .join(location)
                .map_err(|e| ProxyError::malformed(location, e.to_string()))?;

            tracing::debug!(
                from = %target,
                to = %next,
                hop = hops,
                "Following redirect"
            );
            metrics::record_redirect();

            vetted = self.guard.vet(next.as_str()).await?;
        }
    }
}
