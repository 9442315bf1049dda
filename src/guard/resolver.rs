//! Hostname resolution.
//!
//! Literal IP hosts are wrapped without touching the network. Names get one
//! forward lookup through a [`NameResolver`], bounded by a deadline; the first
//! answer is the address that will be classified and dialed.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use thiserror::Error;

use crate::error::ProxyError;

/// Failure reported by a [`NameResolver`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ResolveError {
    pub message: String,
}

impl ResolveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Forward name resolution collaborator.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Look up the addresses of `host`, in resolver order.
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

/// Production resolver backed by hickory with the system configuration.
pub struct DnsResolver {
    inner: TokioResolver,
}

impl DnsResolver {
    pub fn from_system_conf() -> Result<Self, ResolveError> {
        let inner = TokioResolver::builder_tokio()
            .map_err(|e| ResolveError::new(e.to_string()))?
            .build();
        Ok(Self { inner })
    }
}

#[async_trait]
impl NameResolver for DnsResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        let response = self
            .inner
            .lookup_ip(host)
            .await
            .map_err(|e| ResolveError::new(e.to_string()))?;
        Ok(response.iter().collect())
    }
}

/// Address family of a [`ResolvedAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

/// The concrete IP a request will be dialed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAddress {
    ip: IpAddr,
    family: AddressFamily,
}

impl ResolvedAddress {
    pub fn new(ip: IpAddr) -> Self {
        let family = match ip {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        };
        Self { ip, family }
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }
}

/// Parse `host` as an IP literal, tolerating IPv6 brackets.
pub fn parse_literal(host: &str) -> Option<IpAddr> {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .ok()
}

/// Single-attempt, time-bounded resolver.
#[derive(Clone)]
pub struct Resolver {
    names: Arc<dyn NameResolver>,
    timeout: Duration,
}

impl Resolver {
    pub fn new(names: Arc<dyn NameResolver>, timeout: Duration) -> Self {
        Self { names, timeout }
    }

    pub async fn resolve(&self, hostname: &str) -> Result<ResolvedAddress, ProxyError> {
        if let Some(ip) = parse_literal(hostname) {
            return Ok(ResolvedAddress::new(ip));
        }

        let answers = tokio::time::timeout(self.timeout, self.names.lookup(hostname))
            .await
            .map_err(|_| ProxyError::resolution(hostname, format!("lookup timed out after {:?}", self.timeout)))?
            .map_err(|e| ProxyError::resolution(hostname, e.message))?;

        let ip = answers
            .into_iter()
            .next()
            .ok_or_else(|| ProxyError::resolution(hostname, "no addresses found"))?;

        tracing::debug!(host = %hostname, ip = %ip, "Resolved target host");
        Ok(ResolvedAddress::new(ip))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Table-driven resolver that counts lookups.
    #[derive(Default)]
    pub(crate) struct StaticResolver {
        pub answers: HashMap<String, Vec<IpAddr>>,
        pub calls: AtomicUsize,
        pub delay: Option<Duration>,
    }

    impl StaticResolver {
        pub fn with(entries: &[(&str, &str)]) -> Self {
            let mut answers: HashMap<String, Vec<IpAddr>> = HashMap::new();
            for (host, ip) in entries {
                answers
                    .entry(host.to_string())
                    .or_default()
                    .push(ip.parse().unwrap());
            }
            Self {
                answers,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl NameResolver for StaticResolver {
        async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.answers
                .get(host)
                .cloned()
                .ok_or_else(|| ResolveError::new("NXDOMAIN"))
        }
    }

    fn resolver(names: Arc<StaticResolver>) -> Resolver {
        Resolver::new(names, Duration::from_secs(3))
    }

    #[tokio::test]
    async fn test_literal_skips_lookup() {
        let names = Arc::new(StaticResolver::default());
        let r = resolver(names.clone());

        let v4 = r.resolve("93.184.216.34").await.unwrap();
        assert_eq!(v4.family(), AddressFamily::V4);
        let v6 = r.resolve("[2001:4860:4860::8888]").await.unwrap();
        assert_eq!(v6.family(), AddressFamily::V6);
        assert_eq!(names.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_takes_first_answer() {
        let names = Arc::new(StaticResolver::with(&[
            ("example.com", "93.184.216.34"),
            ("example.com", "10.0.0.1"),
        ]));
        let r = resolver(names.clone());

        let resolved = r.resolve("example.com").await.unwrap();
        assert_eq!(resolved.ip(), "93.184.216.34".parse::<IpAddr>().unwrap());
        assert_eq!(names.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lookup_error_is_resolution_failure() {
        let r = resolver(Arc::new(StaticResolver::default()));
        assert!(matches!(
            r.resolve("missing.test").await,
            Err(ProxyError::ResolutionFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_answer_is_resolution_failure() {
        let mut names = StaticResolver::default();
        names.answers.insert("empty.test".into(), Vec::new());
        let r = resolver(Arc::new(names));
        assert!(matches!(
            r.resolve("empty.test").await,
            Err(ProxyError::ResolutionFailure { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_lookup_is_bounded() {
        let mut names = StaticResolver::with(&[("slow.test", "93.184.216.34")]);
        names.delay = Some(Duration::from_secs(60));
        let r = Resolver::new(Arc::new(names), Duration::from_secs(3));

        match r.resolve("slow.test").await {
            Err(ProxyError::ResolutionFailure { message, .. }) => assert!(message.contains("timed out")),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
