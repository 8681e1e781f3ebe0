//! # Aggregator
//! Fetch → parse → dedupe → sort, cached for a TTL, sliced per request.
//!
//! `NewsAggregator` owns the cache and the fetcher; it is built once per
//! process and shared through the Axum state.

use std::collections::HashSet;
use std::sync::Arc;

use metrics::{counter, gauge};
use tracing::{debug, info, warn};

use crate::cache::{Clock, FeedCache, SystemClock};
use crate::config::NewsConfig;
use crate::fallback::fallback_items;
use crate::ingest::fetcher::{FeedFetcher, Fetcher};
use crate::ingest::types::{Category, FeedSource, NormalizedItem, PublishedAt, Region};
use crate::ingest::{ensure_metrics_described, parser, title_key, url_key};

/// Requested slice of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsFilter {
    All,
    Region(Region),
    Tag(Category),
    /// A tag name nobody assigns; matches nothing.
    Unknown(String),
}

impl NewsFilter {
    /// Missing, blank or `all` means everything; `Local`/`International`
    /// select a region; anything else is a tag.
    pub fn parse(raw: Option<&str>) -> Self {
        let s = raw.map(str::trim).unwrap_or_default();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return NewsFilter::All;
        }
        if s.eq_ignore_ascii_case("local") {
            return NewsFilter::Region(Region::Local);
        }
        if s.eq_ignore_ascii_case("international") {
            return NewsFilter::Region(Region::International);
        }
        match Category::from_name(s) {
            Some(c) => NewsFilter::Tag(c),
            None => NewsFilter::Unknown(s.to_string()),
        }
    }

    fn matches(&self, it: &NormalizedItem) -> bool {
        match self {
            NewsFilter::All => true,
            NewsFilter::Region(r) => it.region == *r,
            NewsFilter::Tag(c) => it.has_tag(*c),
            NewsFilter::Unknown(_) => false,
        }
    }
}

/// Slice sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub all: usize,
    pub category: usize,
}

impl Limits {
    pub fn for_filter(&self, f: &NewsFilter) -> usize {
        match f {
            NewsFilter::All => self.all,
            _ => self.category,
        }
    }
}

impl From<&NewsConfig> for Limits {
    fn from(cfg: &NewsConfig) -> Self {
        Self {
            all: cfg.limit_all,
            category: cfg.limit_category,
        }
    }
}

/// Drop later items whose URL (case-insensitive) or normalized title was
/// already kept. Returns the survivors and the number dropped.
pub fn dedupe(items: Vec<NormalizedItem>) -> (Vec<NormalizedItem>, usize) {
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(items.len());
    let mut dropped = 0usize;

    for it in items {
        let u = url_key(&it.url);
        let t = title_key(&it.title);
        if seen_urls.contains(&u) || (!t.is_empty() && seen_titles.contains(&t)) {
            dropped += 1;
            continue;
        }
        seen_urls.insert(u);
        if !t.is_empty() {
            seen_titles.insert(t);
        }
        keep.push(it);
    }
    (keep, dropped)
}

/// Newest first; unparsable dates after all parsable ones. Stable.
pub fn sort_newest_first(items: &mut Vec<NormalizedItem>) {
    let mut keyed: Vec<(PublishedAt, NormalizedItem)> =
        items.drain(..).map(|it| (it.published(), it)).collect();
    keyed.sort_by(|a, b| PublishedAt::newest_first(&a.0, &b.0));
    items.extend(keyed.into_iter().map(|(_, it)| it));
}

/// Filter then truncate to the filter's limit.
pub fn select(items: &[NormalizedItem], filter: &NewsFilter, limits: Limits) -> Vec<NormalizedItem> {
    items
        .iter()
        .filter(|it| filter.matches(it))
        .take(limits.for_filter(filter))
        .cloned()
        .collect()
}

/// Result of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    pub items: Vec<NormalizedItem>,
    /// Sources that failed during this request's fetch pass; empty when
    /// served from cache.
    pub failed_sources: Vec<String>,
    pub is_fallback: bool,
}

/// Outcome of one live pass.
#[derive(Debug, Clone, Default)]
pub struct PassResult {
    pub items: Vec<NormalizedItem>,
    pub failed_sources: Vec<String>,
    pub deduped: usize,
}

pub struct NewsAggregator {
    sources: Vec<FeedSource>,
    fetcher: Fetcher,
    cache: FeedCache,
    limits: Limits,
}

impl NewsAggregator {
    pub fn new(
        cfg: &NewsConfig,
        sources: Vec<FeedSource>,
        transport: Arc<dyn FeedFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        ensure_metrics_described();
        gauge!("news_cache_ttl_secs").set(cfg.cache_ttl.as_secs_f64());
        Self {
            sources,
            fetcher: Fetcher::new(transport, cfg.fetch_timeout),
            cache: FeedCache::new(cfg.cache_ttl, clock),
            limits: Limits::from(cfg),
        }
    }

    pub fn with_system_clock(
        cfg: &NewsConfig,
        sources: Vec<FeedSource>,
        transport: Arc<dyn FeedFetcher>,
    ) -> Self {
        Self::new(cfg, sources, transport, Arc::new(SystemClock))
    }

    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Serve a slice of the aggregated feed. Uses the cached snapshot while
    /// it is fresh, otherwise runs a live pass and replaces the snapshot.
    /// Falls back to the curated list whenever the slice would be empty.
    /// `locale` is accepted for API symmetry; items are not localized.
    pub async fn get_aggregated_feed(
        &self,
        category: Option<&str>,
        _locale: Option<&str>,
    ) -> FeedResponse {
        let filter = NewsFilter::parse(category);

        if let Some(items) = self.cache.fresh() {
            counter!("news_cache_hits_total").increment(1);
            debug!(cached = items.len(), ?filter, "serving news from cache");
            return self.respond(&items, &filter, Vec::new());
        }

        counter!("news_cache_refresh_total").increment(1);
        let pass = self.run_pass().await;
        if pass.items.is_empty() {
            warn!(
                failed = pass.failed_sources.len(),
                "live pass produced no items; cache left untouched"
            );
            return self.fallback_response(&filter, pass.failed_sources);
        }

        let items = self.cache.store(pass.items);
        gauge!("news_cache_items").set(items.len() as f64);
        self.respond(&items, &filter, pass.failed_sources)
    }

    /// One full fetch + parse + dedupe + sort pass. Does not touch the cache.
    pub async fn run_pass(&self) -> PassResult {
        let outcomes = self.fetcher.fetch_all(&self.sources).await;

        let mut all = Vec::new();
        let mut failed_sources = Vec::new();
        for o in outcomes {
            match o.result {
                Ok(payload) => all.extend(parser::parse(&payload, &o.source)),
                Err(_) => failed_sources.push(o.source.name),
            }
        }

        let (mut items, deduped) = dedupe(all);
        counter!("news_dedup_dropped_total").increment(deduped as u64);
        sort_newest_first(&mut items);

        info!(
            items = items.len(),
            failed = failed_sources.len(),
            deduped,
            "news aggregation pass finished"
        );
        PassResult {
            items,
            failed_sources,
            deduped,
        }
    }

    /// Fallback slice for `filter`; never empty.
    pub fn fallback_response(&self, filter: &NewsFilter, failed_sources: Vec<String>) -> FeedResponse {
        counter!("news_fallback_served_total").increment(1);
        let pool = fallback_items();
        let mut items = select(&pool, filter, self.limits);
        if items.is_empty() {
            items = pool
                .into_iter()
                .take(self.limits.for_filter(filter).max(1))
                .collect();
        }
        FeedResponse {
            items,
            failed_sources,
            is_fallback: true,
        }
    }

    fn respond(
        &self,
        items: &[NormalizedItem],
        filter: &NewsFilter,
        failed_sources: Vec<String>,
    ) -> FeedResponse {
        let slice = select(items, filter, self.limits);
        if slice.is_empty() {
            return self.fallback_response(filter, failed_sources);
        }
        FeedResponse {
            items: slice,
            failed_sources,
            is_fallback: false,
        }
    }
}
