// tests/common/mod.rs
// Shared test doubles: a scripted transport and source builders.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use csdept_news::cache::ManualClock;
use csdept_news::ingest::fetcher::{FeedFetcher, FetchFailure};
use csdept_news::ingest::types::{Category, FeedSource, RawPayload, Region};
use csdept_news::{NewsAggregator, NewsConfig};

#[derive(Clone)]
pub enum Script {
    Body(String),
    Fail(FetchFailure),
    Hang,
}

/// Transport that answers by source URL and counts calls.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: HashMap<String, Script>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: &FeedSource, script: Script) -> Self {
        self.scripts.insert(source.url.clone(), script);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedFetcher for ScriptedFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<RawPayload, FetchFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.scripts.get(&source.url) {
            Some(Script::Body(b)) => Ok(RawPayload::new(b.clone())),
            Some(Script::Fail(f)) => Err(f.clone()),
            Some(Script::Hang) => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(FetchFailure::Network("hung".into()))
            }
            None => Err(FetchFailure::Status(404)),
        }
    }
}

pub fn source(name: &str, category: Category, region: Region) -> FeedSource {
    let slug: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    FeedSource::new(&format!("https://{slug}.test/feed"), name, category, region)
}

/// Config with a short fetch timeout so hanging sources resolve quickly.
pub fn test_config() -> NewsConfig {
    NewsConfig {
        fetch_timeout: Duration::from_millis(200),
        ..NewsConfig::default()
    }
}

pub fn aggregator(
    sources: Vec<FeedSource>,
    fetcher: Arc<ScriptedFetcher>,
    clock: Arc<ManualClock>,
) -> NewsAggregator {
    NewsAggregator::new(&test_config(), sources, fetcher, clock)
}

/// Minimal RSS 2.0 document; each tuple is (title, link, pubDate, description).
pub fn rss(items: &[(&str, &str, &str, &str)]) -> String {
    let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>T</title>"#);
    for (title, link, date, desc) in items {
        out.push_str(&format!(
            "<item><title>{title}</title><link>{link}</link><pubDate>{date}</pubDate><description><![CDATA[{desc}]]></description></item>"
        ));
    }
    out.push_str("</channel></rss>");
    out
}
