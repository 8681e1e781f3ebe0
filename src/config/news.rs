// src/config/news.rs
use std::time::Duration;

pub const ENV_CACHE_TTL_SECS: &str = "NEWS_CACHE_TTL_SECS";
pub const ENV_FETCH_TIMEOUT_MS: &str = "NEWS_FETCH_TIMEOUT_MS";
pub const ENV_USER_AGENT: &str = "NEWS_USER_AGENT";
pub const ENV_LIMIT_ALL: &str = "NEWS_LIMIT_ALL";
pub const ENV_LIMIT_CATEGORY: &str = "NEWS_LIMIT_CATEGORY";

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(12 * 60 * 60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(9_000);
pub const DEFAULT_USER_AGENT: &str = "csdept-news-bot/1.0 (+https://cs.vantondertech.dev)";
pub const DEFAULT_ACCEPT: &str =
    "application/rss+xml, application/atom+xml, application/xml, text/xml, application/json, text/html";
pub const DEFAULT_LIMIT_ALL: usize = 40;
pub const DEFAULT_LIMIT_CATEGORY: usize = 10;

/// Aggregator tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsConfig {
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub user_agent: String,
    pub accept: String,
    /// Slice size for `category=all`.
    pub limit_all: usize,
    /// Slice size for a single tag or region.
    pub limit_category: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            limit_all: DEFAULT_LIMIT_ALL,
            limit_category: DEFAULT_LIMIT_CATEGORY,
        }
    }
}

// parse a positive integer env value; anything else keeps the default
fn parse_positive(raw: Option<String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
}

impl NewsConfig {
    /// Defaults overridden by `NEWS_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(v) = parse_positive(get(ENV_CACHE_TTL_SECS)) {
            cfg.cache_ttl = Duration::from_secs(v);
        }
        if let Some(v) = parse_positive(get(ENV_FETCH_TIMEOUT_MS)) {
            cfg.fetch_timeout = Duration::from_millis(v);
        }
        if let Some(ua) = get(ENV_USER_AGENT).map(|s| s.trim().to_string()) {
            if !ua.is_empty() {
                cfg.user_agent = ua;
            }
        }
        if let Some(v) = parse_positive(get(ENV_LIMIT_ALL)) {
            cfg.limit_all = v as usize;
        }
        if let Some(v) = parse_positive(get(ENV_LIMIT_CATEGORY)) {
            cfg.limit_category = v as usize;
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| m.get(k).cloned()
    }

    #[test]
    fn defaults_are_sane() {
        let c = NewsConfig::default();
        assert_eq!(c.cache_ttl, Duration::from_secs(43_200));
        assert_eq!(c.fetch_timeout, Duration::from_secs(9));
        assert_eq!((c.limit_all, c.limit_category), (40, 10));
    }

    #[test]
    fn env_overrides_and_garbage_is_ignored() {
        let c = NewsConfig::from_lookup(lookup(&[
            (ENV_CACHE_TTL_SECS, "60"),
            (ENV_FETCH_TIMEOUT_MS, "oops"),
            (ENV_LIMIT_ALL, "0"),
            (ENV_LIMIT_CATEGORY, " 5 "),
            (ENV_USER_AGENT, "  "),
        ]));
        assert_eq!(c.cache_ttl, Duration::from_secs(60));
        assert_eq!(c.fetch_timeout, DEFAULT_FETCH_TIMEOUT);
        assert_eq!(c.limit_all, DEFAULT_LIMIT_ALL);
        assert_eq!(c.limit_category, 5);
        assert_eq!(c.user_agent, DEFAULT_USER_AGENT);
    }
}
