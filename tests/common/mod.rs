//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ipnet::IpNet;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use ssrf_proxy::config::ProxyConfig;
use ssrf_proxy::guard::{NameResolver, ReservedRanges, ResolveError};
use ssrf_proxy::upstream::{ReqwestTransport, TransportSettings};
use ssrf_proxy::ProxyPipeline;

/// A canned HTTP response.
#[derive(Clone)]
pub struct Canned {
    pub status: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
    pub delay: Option<Duration>,
}

impl Canned {
    pub fn ok(content_type: Option<&str>, body: &str) -> Self {
        let mut headers = Vec::new();
        if let Some(ct) = content_type {
            headers.push(("Content-Type", ct.to_string()));
        }
        Self {
            status: "200 OK",
            headers,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            status: "302 Found",
            headers: vec![("Location", location.to_string())],
            body: String::new(),
            delay: None,
        }
    }

    pub fn stalled(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::ok(Some("text/plain"), "too late")
        }
    }

    fn render(&self) -> String {
        let mut out = format!("HTTP/1.1 {}\r\n", self.status);
        for (name, value) in &self.headers {
            out.push_str(&format!("{}: {}\r\n", name, value));
        }
        out.push_str(&format!(
            "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.body.len(),
            self.body
        ));
        out
    }
}

/// A mock upstream that answers every request with the same response and
/// records the Host header of each request it read.
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
    pub hosts: Arc<Mutex<Vec<String>>>,
}

pub async fn start_mock_upstream(response: Canned) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let hosts = Arc::new(Mutex::new(Vec::new()));

    let (h, hs) = (hits.clone(), hosts.clone());
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let response = response.clone();
                    let (h, hs) = (h.clone(), hs.clone());
                    tokio::spawn(async move {
                        serve_one(socket, response, h, hs).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockUpstream { addr, hits, hosts }
}

async fn serve_one(mut socket: TcpStream, response: Canned, hits: Arc<AtomicUsize>, hosts: Arc<Mutex<Vec<String>>>) {
    let head = read_head(&mut socket).await;
    hits.fetch_add(1, Ordering::SeqCst);

    if let Some(host) = head
        .lines()
        .find_map(|line| line.strip_prefix("host: ").or_else(|| line.strip_prefix("Host: ")))
    {
        hosts.lock().unwrap().push(host.trim().to_string());
    }

    if let Some(delay) = response.delay {
        tokio::time::sleep(delay).await;
    }

    let _ = socket.write_all(response.render().as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Resolver answering from a fixed table and counting lookups.
#[derive(Default)]
pub struct TableResolver {
    answers: HashMap<String, IpAddr>,
    pub calls: AtomicUsize,
}

impl TableResolver {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            answers: entries
                .iter()
                .map(|(host, ip)| (host.to_string(), ip.parse().unwrap()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl NameResolver for TableResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(host)
            .map(|ip| vec![*ip])
            .ok_or_else(|| ResolveError::new("NXDOMAIN"))
    }
}

/// The standard table minus 127.0.0.0/8, so mock upstreams on loopback are
/// reachable. Every other reserved block stays in force.
pub fn ranges_without_ipv4_loopback() -> Arc<ReservedRanges> {
    let loopback: IpNet = "127.0.0.0/8".parse().unwrap();
    let kept = ReservedRanges::standard()
        .iter()
        .filter(|r| r.net != loopback)
        .copied()
        .collect();
    Arc::new(ReservedRanges::new(kept))
}

/// Pipeline with the real reqwest transport.
pub fn real_pipeline(config: &ProxyConfig, ranges: Arc<ReservedRanges>, names: Arc<TableResolver>) -> ProxyPipeline {
    let transport = Arc::new(ReqwestTransport::new(TransportSettings {
        connect_timeout: Duration::from_millis(config.timeouts.connect_ms),
        max_body_bytes: config.fetch.max_body_bytes,
        user_agent: config.fetch.user_agent.clone(),
    }));
    ProxyPipeline::with_collaborators(config, ranges, names, transport)
}
