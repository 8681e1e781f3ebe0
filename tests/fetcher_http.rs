// tests/fetcher_http.rs
//
// Real reqwest transport against a local Axum server on an ephemeral port:
// request headers, status mapping, redirects and the fetch timeout.

use std::time::Duration;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    routing::get,
    Router,
};
use tokio::net::TcpListener;

use csdept_news::ingest::fetcher::{FeedFetcher, FetchFailure, Fetcher, HttpFetcher};
use csdept_news::{Category, FeedSource, NewsConfig, Region};
use std::sync::Arc;

async fn echo_headers(headers: HeaderMap) -> impl IntoResponse {
    let get = |k: header::HeaderName| {
        headers
            .get(k)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    (
        [(header::CONTENT_TYPE, "text/plain")],
        format!("ua={}\naccept={}", get(header::USER_AGENT), get(header::ACCEPT)),
    )
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "<rss/>"
}

/// Serve a small fixture app; returns its base URL.
async fn spawn_server() -> String {
    let app = Router::new()
        .route("/echo", get(echo_headers))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route("/moved", get(|| async { Redirect::permanent("/feed") }))
        .route(
            "/feed",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "application/rss+xml")],
                    "<rss><channel></channel></rss>",
                )
            }),
        )
        .route("/slow", get(slow));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn cfg() -> NewsConfig {
    NewsConfig {
        fetch_timeout: Duration::from_millis(300),
        user_agent: "csdept-news-test/0.1".into(),
        ..NewsConfig::default()
    }
}

fn src(url: String) -> FeedSource {
    FeedSource::new(&url, "local", Category::Research, Region::Local)
}

#[tokio::test]
async fn sends_identifying_headers() {
    let base = spawn_server().await;
    let cfg = cfg();
    let http = HttpFetcher::new(&cfg).expect("client");

    let payload = http.fetch(&src(format!("{base}/echo"))).await.expect("fetch");
    assert!(payload.body.contains("ua=csdept-news-test/0.1"));
    assert!(payload.body.contains("application/rss+xml"));
    assert!(payload.body.contains("application/atom+xml"));
    assert_eq!(payload.content_type.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn non_success_status_is_a_failure() {
    let base = spawn_server().await;
    let http = HttpFetcher::new(&cfg()).expect("client");
    let err = http
        .fetch(&src(format!("{base}/missing")))
        .await
        .expect_err("404 must fail");
    assert_eq!(err, FetchFailure::Status(404));
}

#[tokio::test]
async fn redirects_are_followed() {
    let base = spawn_server().await;
    let http = HttpFetcher::new(&cfg()).expect("client");
    let payload = http.fetch(&src(format!("{base}/moved"))).await.expect("fetch");
    assert!(payload.body.starts_with("<rss>"));
    assert_eq!(payload.content_type.as_deref(), Some("application/rss+xml"));
}

#[tokio::test]
async fn slow_source_times_out() {
    let base = spawn_server().await;
    let cfg = cfg();
    let fetcher = Fetcher::new(Arc::new(HttpFetcher::new(&cfg).expect("client")), cfg.fetch_timeout);

    let started = std::time::Instant::now();
    let err = fetcher
        .fetch_one(&src(format!("{base}/slow")))
        .await
        .expect_err("must time out");
    assert_eq!(err, FetchFailure::Timeout(Duration::from_millis(300)));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn unreachable_host_is_a_network_failure() {
    let http = HttpFetcher::new(&cfg()).expect("client");
    // port 9 (discard) on loopback: connection refused on any sane test host
    let err = http
        .fetch(&src("http://127.0.0.1:9/feed".to_string()))
        .await
        .expect_err("must fail");
    assert!(matches!(err, FetchFailure::Network(_)));
}
