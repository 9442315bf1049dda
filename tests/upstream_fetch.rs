//! Pipeline tests against real sockets with the reqwest transport.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::HeaderValue;
use ssrf_proxy::config::ProxyConfig;
use ssrf_proxy::guard::ReservedRanges;
use ssrf_proxy::pipeline::{ProxyOutcome, RejectReason, UpstreamReason};

mod common;
use common::{closed_port, ranges_without_ipv4_loopback, real_pipeline, start_mock_upstream, Canned, TableResolver};

#[tokio::test]
async fn test_success_dials_pinned_address_with_original_host() {
    let upstream = start_mock_upstream(Canned::ok(Some("text/plain"), "hi")).await;
    let names = Arc::new(TableResolver::new(&[("upstream.test", "127.0.0.1")]));
    let pipeline = real_pipeline(&ProxyConfig::default(), ranges_without_ipv4_loopback(), names.clone());

    let uri = format!("http://upstream.test:{}/greeting?x=1", upstream.addr.port());
    let outcome = pipeline.run(Some(&uri)).await;

    assert_eq!(
        outcome,
        ProxyOutcome::Success {
            content_type: HeaderValue::from_static("text/plain"),
            body: Bytes::from_static(b"hi"),
        }
    );
    assert_eq!(names.calls.load(Ordering::SeqCst), 1);
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);
    assert_eq!(
        upstream.hosts.lock().unwrap().as_slice(),
        &[format!("upstream.test:{}", upstream.addr.port())]
    );
}

#[tokio::test]
async fn test_standard_table_blocks_loopback_upstream() {
    let upstream = start_mock_upstream(Canned::ok(Some("text/plain"), "secret")).await;
    let names = Arc::new(TableResolver::new(&[("upstream.test", "127.0.0.1")]));
    let pipeline = real_pipeline(&ProxyConfig::default(), Arc::new(ReservedRanges::standard()), names);

    for uri in [
        format!("http://upstream.test:{}/", upstream.addr.port()),
        format!("http://127.0.0.1:{}/", upstream.addr.port()),
        format!("http://[::ffff:127.0.0.1]:{}/", upstream.addr.port()),
    ] {
        assert_eq!(
            pipeline.run(Some(&uri)).await,
            ProxyOutcome::Rejected(RejectReason::ReservedAddress),
            "{uri}"
        );
    }
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_content_type_defaults_to_text_plain() {
    let upstream = start_mock_upstream(Canned::ok(None, "raw")).await;
    let pipeline = real_pipeline(
        &ProxyConfig::default(),
        ranges_without_ipv4_loopback(),
        Arc::new(TableResolver::default()),
    );

    let uri = format!("http://127.0.0.1:{}/", upstream.addr.port());
    match pipeline.run(Some(&uri)).await {
        ProxyOutcome::Success { content_type, body } => {
            assert_eq!(content_type, "text/plain");
            assert_eq!(body, Bytes::from_static(b"raw"));
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn test_redirect_into_private_space_is_not_followed() {
    let target = start_mock_upstream(Canned::ok(Some("text/plain"), "internal")).await;
    let names = Arc::new(TableResolver::new(&[("intranet.test", "10.0.0.7")]));
    let redirector = start_mock_upstream(Canned::redirect("http://intranet.test/admin")).await;
    let pipeline = real_pipeline(&ProxyConfig::default(), ranges_without_ipv4_loopback(), names);

    let uri = format!("http://127.0.0.1:{}/", redirector.addr.port());
    assert_eq!(
        pipeline.run(Some(&uri)).await,
        ProxyOutcome::Rejected(RejectReason::ReservedAddress)
    );
    assert_eq!(redirector.hits.load(Ordering::SeqCst), 1);
    assert_eq!(target.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_redirect_to_allowed_upstream_is_followed() {
    let target = start_mock_upstream(Canned::ok(Some("application/json"), "{}")).await;
    let redirector =
        start_mock_upstream(Canned::redirect(&format!("http://127.0.0.1:{}/final", target.addr.port()))).await;
    let pipeline = real_pipeline(
        &ProxyConfig::default(),
        ranges_without_ipv4_loopback(),
        Arc::new(TableResolver::default()),
    );

    let uri = format!("http://127.0.0.1:{}/start", redirector.addr.port());
    match pipeline.run(Some(&uri)).await {
        ProxyOutcome::Success { content_type, .. } => assert_eq!(content_type, "application/json"),
        other => panic!("expected success, got {other:?}"),
    }
    assert_eq!(target.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_multiple_choices_body_is_relayed() {
    let upstream = start_mock_upstream(Canned {
        status: "300 Multiple Choices",
        ..Canned::ok(Some("text/html"), "<a href=/a>a</a>")
    })
    .await;
    let pipeline = real_pipeline(
        &ProxyConfig::default(),
        ranges_without_ipv4_loopback(),
        Arc::new(TableResolver::default()),
    );

    let uri = format!("http://127.0.0.1:{}/", upstream.addr.port());
    assert_eq!(
        pipeline.run(Some(&uri)).await,
        ProxyOutcome::Success {
            content_type: HeaderValue::from_static("text/html"),
            body: Bytes::from_static(b"<a href=/a>a</a>"),
        }
    );
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_slow_upstream_hits_fetch_deadline() {
    let upstream = start_mock_upstream(Canned::stalled(Duration::from_secs(5))).await;
    let mut config = ProxyConfig::default();
    config.timeouts.fetch_ms = 300;
    let pipeline = real_pipeline(&config, ranges_without_ipv4_loopback(), Arc::new(TableResolver::default()));

    let started = Instant::now();
    let uri = format!("http://127.0.0.1:{}/", upstream.addr.port());
    assert_eq!(
        pipeline.run(Some(&uri)).await,
        ProxyOutcome::UpstreamFailure(UpstreamReason::Timeout)
    );
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_oversized_body_is_upstream_error() {
    let upstream = start_mock_upstream(Canned::ok(Some("text/plain"), &"x".repeat(4096))).await;
    let mut config = ProxyConfig::default();
    config.fetch.max_body_bytes = 1024;
    let pipeline = real_pipeline(&config, ranges_without_ipv4_loopback(), Arc::new(TableResolver::default()));

    let uri = format!("http://127.0.0.1:{}/", upstream.addr.port());
    assert_eq!(
        pipeline.run(Some(&uri)).await,
        ProxyOutcome::UpstreamFailure(UpstreamReason::Error)
    );
}

#[tokio::test]
async fn test_refused_connection_is_upstream_error() {
    let addr = closed_port().await;
    let pipeline = real_pipeline(
        &ProxyConfig::default(),
        ranges_without_ipv4_loopback(),
        Arc::new(TableResolver::default()),
    );

    let uri = format!("http://127.0.0.1:{}/", addr.port());
    assert_eq!(
        pipeline.run(Some(&uri)).await,
        ProxyOutcome::UpstreamFailure(UpstreamReason::Error)
    );
}
