//! Strict parsing of caller-supplied target URIs.

use url::{Host, Url};

use crate::error::ProxyError;

/// Schemes a target may use unless configuration narrows them further.
pub const DEFAULT_SCHEMES: &[&str] = &["http", "https"];

/// A structurally valid target. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTarget {
    url: Url,
    hostname: String,
    port: u16,
}

impl ParsedTarget {
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Hostname as encoded in the URI. IPv6 literals keep their brackets.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Explicit port, or the scheme default.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    pub fn is_https(&self) -> bool {
        self.url.scheme() == "https"
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Normalized form used for forwarding.
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl std::fmt::Display for ParsedTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Validates candidate URIs against a scheme allow-list.
#[derive(Debug, Clone)]
pub struct UriValidator {
    schemes: Vec<String>,
}

impl Default for UriValidator {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMES.iter().map(|s| s.to_string()))
    }
}

impl UriValidator {
    /// Build a validator. Schemes outside http/https are dropped so the
    /// allow-list can only narrow.
    pub fn new(schemes: impl IntoIterator<Item = String>) -> Self {
        let schemes = schemes
            .into_iter()
            .map(|s| s.to_ascii_lowercase())
            .filter(|s| DEFAULT_SCHEMES.contains(&s.as_str()))
            .collect();
        Self { schemes }
    }

    pub fn schemes(&self) -> &[String] {
        &self.schemes
    }

    /// Parse `candidate` into a [`ParsedTarget`].
    pub fn parse(&self, candidate: &str) -> Result<ParsedTarget, ProxyError> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return Err(ProxyError::MissingUri);
        }

        let url = Url::parse(candidate).map_err(|e| ProxyError::malformed(candidate, e.to_string()))?;

        if !self.schemes.iter().any(|s| s == url.scheme()) {
            return Err(ProxyError::malformed(
                candidate,
                format!("scheme {:?} is not allowed", url.scheme()),
            ));
        }

        if !url.username().is_empty() || url.password().is_some() {
            return Err(ProxyError::malformed(candidate, "credentials in uri are not allowed"));
        }

        let hostname = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => format!("[{}]", ip),
            _ => return Err(ProxyError::malformed(candidate, "uri has no host")),
        };

        let port = url
            .port_or_known_default()
            .ok_or_else(|| ProxyError::malformed(candidate, "uri has no port"))?;

        Ok(ParsedTarget { url, hostname, port })
    }
}
