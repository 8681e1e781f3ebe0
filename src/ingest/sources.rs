// src/ingest/sources.rs
//! Feed source registry: built-in list plus optional file override.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::{Category, FeedSource, Region};

pub const ENV_SOURCES_PATH: &str = "NEWS_SOURCES_PATH";

const HN_SEARCH: &str = "https://hn.algolia.com/api/v1/search_by_date";

/// Built-in registry: publisher RSS/Atom feeds, arXiv listings and two
/// Hacker News search queries (JSON).
pub fn default_sources() -> Vec<FeedSource> {
    use Category::*;
    use Region::*;
    vec![
        FeedSource::new("https://feeds.arstechnica.com/arstechnica/index", "Ars Technica", Research, International),
        FeedSource::new("https://www.theverge.com/rss/index.xml", "The Verge", Software, International),
        FeedSource::new("https://www.wired.com/feed/rss", "Wired", Software, International),
        FeedSource::new("https://www.technologyreview.com/feed/", "MIT Technology Review", Research, International),
        FeedSource::new("https://spectrum.ieee.org/feeds/feed.rss", "IEEE Spectrum", Research, International),
        FeedSource::new("https://blog.google/technology/developers/rss/", "Google Developers Blog", Software, International),
        FeedSource::new("https://aws.amazon.com/blogs/aws/feed/", "AWS Blog", Software, International),
        FeedSource::new("https://openai.com/blog/rss.xml", "OpenAI Blog", AI, International),
        FeedSource::new("https://deepmind.google/blog/rss/", "DeepMind Blog", AI, International),
        FeedSource::new("https://theconversation.com/africa/articles.atom", "The Conversation (Africa)", Research, Local),
        FeedSource::new("https://export.arxiv.org/rss/cs.AI", "arXiv cs.AI", AI, International),
        FeedSource::new("https://export.arxiv.org/rss/cs.LG", "arXiv cs.LG", AI, International),
        FeedSource::new("https://export.arxiv.org/rss/cs.CR", "arXiv cs.CR", Cybersecurity, International),
        FeedSource::new("https://export.arxiv.org/rss/cs", "arXiv cs", Research, International),
        FeedSource::new(
            &format!("{HN_SEARCH}?query=computer%20science&tags=story&hitsPerPage=15"),
            "Hacker News (computer science)",
            Software,
            International,
        ),
        FeedSource::new(
            &format!("{HN_SEARCH}?query=artificial%20intelligence&tags=story&hitsPerPage=15"),
            "Hacker News (AI)",
            AI,
            International,
        ),
    ]
}

/// Load sources from an explicit path. Supports TOML (`[[sources]]`) or a JSON array.
pub fn load_sources_from(path: &Path) -> Result<Vec<FeedSource>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading news sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

/// Load sources using env var + fallbacks:
/// 1) $NEWS_SOURCES_PATH
/// 2) config/news_sources.toml
/// 3) config/news_sources.json
/// 4) built-in registry
pub fn load_sources_default() -> Result<Vec<FeedSource>> {
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        } else {
            return Err(anyhow!("{ENV_SOURCES_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/news_sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/news_sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(default_sources())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<FeedSource>> {
    let raw = if hint_ext == "json" || s.trim_start().starts_with('[') {
        serde_json::from_str::<Vec<FeedSource>>(s).context("parsing news sources json")?
    } else {
        #[derive(serde::Deserialize)]
        struct TomlSources {
            sources: Vec<FeedSource>,
        }
        toml::from_str::<TomlSources>(s)
            .context("parsing news sources toml")?
            .sources
    };
    let cleaned = clean_list(raw);
    if cleaned.is_empty() {
        return Err(anyhow!("news source list is empty"));
    }
    Ok(cleaned)
}

/// Trim fields, drop blank entries, keep the first entry per URL.
fn clean_list(items: Vec<FeedSource>) -> Vec<FeedSource> {
    use std::collections::HashSet;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for mut it in items {
        it.url = it.url.trim().to_string();
        it.name = it.name.trim().to_string();
        if it.url.is_empty() || it.name.is_empty() {
            continue;
        }
        if seen.insert(it.url.to_ascii_lowercase()) {
            out.push(it);
        }
    }
    out
}
