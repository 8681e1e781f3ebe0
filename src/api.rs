use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::aggregator::{FeedResponse, NewsAggregator, NewsFilter};
use crate::ingest::types::FrontendItem;

#[derive(Clone)]
pub struct AppState {
    pub news: Arc<NewsAggregator>,
}

impl AppState {
    pub fn new(news: NewsAggregator) -> Self {
        Self {
            news: Arc::new(news),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/news", get(news_feed))
        .route("/api/news", get(news_feed))
        .route("/api/news/feed", get(news_feed))
        .route("/api/health/news", get(news_health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct NewsQuery {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    locale: Option<String>,
}

/// Wire shape of `GET /news`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsBody {
    pub data: Vec<FrontendItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_feeds: Vec<String>,
    pub is_fallback: bool,
}

impl From<FeedResponse> for NewsBody {
    fn from(r: FeedResponse) -> Self {
        Self {
            data: r.items.iter().map(FrontendItem::from).collect(),
            failed_feeds: r.failed_sources,
            is_fallback: r.is_fallback,
        }
    }
}

async fn news_feed(
    State(state): State<AppState>,
    query: Result<Query<NewsQuery>, QueryRejection>,
) -> Json<NewsBody> {
    // A bad query string degrades to the default slice rather than a 400.
    let q = query.map(|Query(q)| q).unwrap_or_default();
    let filter = NewsFilter::parse(q.category.as_deref());

    let outcome = AssertUnwindSafe(
        state
            .news
            .get_aggregated_feed(q.category.as_deref(), q.locale.as_deref()),
    )
    .catch_unwind()
    .await;

    let resp = match outcome {
        Ok(r) => r,
        Err(_) => {
            tracing::error!(?filter, "news aggregation panicked; serving fallback");
            state.news.fallback_response(&filter, Vec::new())
        }
    };
    Json(resp.into())
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsHealth {
    pub ok: bool,
    pub runtime: String,
    pub cache: String,
    pub cached_items: usize,
    pub cache_age_secs: Option<u64>,
    pub sources: usize,
}

async fn news_health(State(state): State<AppState>) -> Json<NewsHealth> {
    let cache = state.news.cache();
    Json(NewsHealth {
        ok: true,
        runtime: "rust-axum".to_string(),
        cache: cache.state().as_str().to_string(),
        cached_items: cache.len(),
        cache_age_secs: cache.age().map(|d| d.as_secs()),
        sources: state.news.sources().len(),
    })
}
