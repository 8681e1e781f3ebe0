// src/ingest/fetcher.rs
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::join_all;
use metrics::{counter, histogram};

use crate::config::NewsConfig;
use crate::ingest::types::{FeedSource, RawPayload};

/// Why a single source contributed nothing to a pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("http status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("reading body failed: {0}")]
    Body(String),
    #[error("fetch task aborted: {0}")]
    Aborted(String),
}

/// Transport seam: one GET for one source. Timeouts are enforced by
/// `Fetcher`, not by implementors.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<RawPayload, FetchFailure>;
}

/// reqwest-backed transport with fixed `User-Agent` / `Accept` headers.
pub struct HttpFetcher {
    client: reqwest::Client,
    accept: String,
}

impl HttpFetcher {
    pub fn new(cfg: &NewsConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            // Backstop; the cooperative timeout in `Fetcher` fires first.
            .timeout(cfg.fetch_timeout + Duration::from_secs(1))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            accept: cfg.accept.clone(),
        })
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<RawPayload, FetchFailure> {
        let resp = self
            .client
            .get(&source.url)
            .header(reqwest::header::ACCEPT, &self.accept)
            .send()
            .await
            .map_err(|e| FetchFailure::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .text()
            .await
            .map_err(|e| FetchFailure::Body(e.to_string()))?;
        Ok(RawPayload { body, content_type })
    }
}

/// Outcome of one source within a pass.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub source: FeedSource,
    pub result: Result<RawPayload, FetchFailure>,
}

/// Time-boxed, failure-tolerant fetching over a `FeedFetcher`.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn FeedFetcher>,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn FeedFetcher>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// One GET, resolved to a failure on timeout instead of hanging.
    pub async fn fetch_one(&self, source: &FeedSource) -> Result<RawPayload, FetchFailure> {
        let t0 = Instant::now();
        counter!("news_fetch_total").increment(1);
        let res = match tokio::time::timeout(self.timeout, self.transport.fetch(source)).await {
            Ok(r) => r,
            Err(_) => Err(FetchFailure::Timeout(self.timeout)),
        };
        histogram!("news_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        if let Err(e) = &res {
            tracing::warn!(source = %source.name, url = %source.url, error = %e, "feed fetch failed");
            counter!("news_fetch_failures_total").increment(1);
        }
        res
    }

    /// Fetch every source concurrently. Each source runs in its own task;
    /// a failure (or panic) in one never cancels the others. Outcomes are
    /// returned in source order.
    pub async fn fetch_all(&self, sources: &[FeedSource]) -> Vec<SourceOutcome> {
        let handles: Vec<_> = sources
            .iter()
            .cloned()
            .map(|source| {
                let this = self.clone();
                tokio::spawn(async move {
                    let result = this.fetch_one(&source).await;
                    SourceOutcome { source, result }
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(sources)
            .map(|(joined, source)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(source = %source.name, error = %e, "fetch task aborted");
                    counter!("news_fetch_failures_total").increment(1);
                    SourceOutcome {
                        source: source.clone(),
                        result: Err(FetchFailure::Aborted(e.to_string())),
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{Category, Region};

    struct Scripted;

    #[async_trait]
    impl FeedFetcher for Scripted {
        async fn fetch(&self, source: &FeedSource) -> Result<RawPayload, FetchFailure> {
            match source.name.as_str() {
                "ok" => Ok(RawPayload::new("<rss/>")),
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(RawPayload::new("late"))
                }
                "boom" => panic!("transport bug"),
                _ => Err(FetchFailure::Status(503)),
            }
        }
    }

    fn s(name: &str) -> FeedSource {
        FeedSource::new(
            &format!("https://{name}.test/"),
            name,
            Category::Research,
            Region::International,
        )
    }

    #[tokio::test]
    async fn one_failure_never_sinks_the_pass() {
        let f = Fetcher::new(Arc::new(Scripted), Duration::from_millis(100));
        let out = f
            .fetch_all(&[s("ok"), s("slow"), s("boom"), s("down")])
            .await;
        assert_eq!(out.len(), 4);
        assert!(out[0].result.is_ok());
        assert_eq!(
            out[1].result,
            Err(FetchFailure::Timeout(Duration::from_millis(100)))
        );
        assert!(matches!(out[2].result, Err(FetchFailure::Aborted(_))));
        assert_eq!(out[3].result, Err(FetchFailure::Status(503)));
        assert_eq!(out[3].source.name, "down");
    }
}
