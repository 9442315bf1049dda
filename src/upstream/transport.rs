//! HTTP transport collaborator.
//!
//! A transport performs exactly one GET against a pinned socket address and
//! never follows redirects itself; redirect handling and re-validation belong
//! to the fetcher.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy as RedirectPolicy;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::{Host, Url};

/// One outbound GET.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    /// URL as sent; its host is used for the Host header and TLS SNI.
    pub url: Url,
    /// Address the connection must be dialed to.
    pub pin: SocketAddr,
}

/// A buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

/// Redirect statuses the fetcher follows. Their bodies are never relayed, so
/// the transport skips reading them; every other status keeps its body.
pub(crate) fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// HTTP transport used by [`crate::upstream::SafeFetcher`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, TransportError>;
}

/// Settings for [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub connect_timeout: Duration,
    pub max_body_bytes: usize,
    pub user_agent: String,
}

/// reqwest-backed transport that dials the pinned address.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    settings: TransportSettings,
}

impl ReqwestTransport {
    pub fn new(settings: TransportSettings) -> Self {
        Self { settings }
    }

    fn client_for(&self, request: &UpstreamRequest) -> Result<Client, TransportError> {
        let mut builder = Client::builder()
            .redirect(RedirectPolicy::none())
            .no_proxy()
            .connect_timeout(self.settings.connect_timeout)
            .user_agent(self.settings.user_agent.clone());

        // Names are pinned to the classified address so a second lookup at
        // connect time cannot hand out a different one. Literals already are.
        if let Some(Host::Domain(domain)) = request.url.host() {
            builder = builder.resolve(domain, request.pin);
        }

        builder.build().map_err(|e| TransportError::Request(e.to_string()))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        let client = self.client_for(request)?;

        let mut response = client
            .get(request.url.clone())
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();

        if is_followed_redirect(status) {
            return Ok(UpstreamResponse {
                status,
                headers,
                body: Bytes::new(),
            });
        }

        let limit = self.settings.max_body_bytes;
        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?
        {
            if body.len() + chunk.len() > limit {
                return Err(TransportError::BodyTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(UpstreamResponse {
            status,
            headers,
            body: body.freeze(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_followed_redirects() {
        for code in [301, 302, 303, 307, 308] {
            assert!(is_followed_redirect(StatusCode::from_u16(code).unwrap()), "{code}");
        }
        for code in [200, 300, 304, 305, 306, 404] {
            assert!(!is_followed_redirect(StatusCode::from_u16(code).unwrap()), "{code}");
        }
    }
}
