// src/lib.rs
// Public library surface for integration tests (and the binary).

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod fallback;
pub mod ingest;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::aggregator::{FeedResponse, NewsAggregator, NewsFilter};
pub use crate::api::{router, AppState};
pub use crate::config::NewsConfig;
pub use crate::ingest::types::{Category, FeedSource, NormalizedItem, Region};

use std::sync::Arc;

use crate::ingest::fetcher::HttpFetcher;

/// Build the production router: real HTTP transport, system clock.
pub fn app(cfg: &NewsConfig, sources: Vec<FeedSource>) -> anyhow::Result<axum::Router> {
    let transport = Arc::new(HttpFetcher::new(cfg)?);
    let aggregator = NewsAggregator::with_system_clock(cfg, sources, transport);
    Ok(router(AppState::new(aggregator)))
}
