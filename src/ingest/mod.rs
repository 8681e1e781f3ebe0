// src/ingest/mod.rs
pub mod fetcher;
pub mod parser;
pub mod sources;
pub mod tagging;
pub mod types;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use sha2::{Digest, Sha256};

/// Upper bound on summary length, in characters.
pub const SUMMARY_MAX_CHARS: usize = 400;

/// Title prefix length used for title-based dedup.
pub const TITLE_KEY_MAX_CHARS: usize = 80;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<[^>]*>").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_IMG_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src\s*=\s*["']([^"']+)["']"#).unwrap());

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_fetch_total", "Feed fetch attempts.");
        describe_counter!(
            "news_fetch_failures_total",
            "Feed fetches that timed out, failed or returned non-2xx."
        );
        describe_counter!(
            "news_parse_failures_total",
            "Payloads that could not be parsed as RSS, Atom or JSON."
        );
        describe_counter!("news_items_parsed_total", "Items produced by the parser.");
        describe_counter!(
            "news_dedup_dropped_total",
            "Items dropped by URL/title deduplication."
        );
        describe_counter!("news_cache_hits_total", "Requests served from a fresh snapshot.");
        describe_counter!("news_cache_refresh_total", "Live aggregation passes.");
        describe_counter!("news_fallback_served_total", "Responses built from the fallback list.");
        describe_histogram!("news_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_gauge!("news_cache_items", "Items in the current snapshot.");
        describe_gauge!("news_cache_ttl_secs", "Snapshot time-to-live in seconds.");
    });
}

/// Plain text from an HTML-bearing field: entities decoded, tags removed,
/// whitespace collapsed, trimmed. No length cap.
pub fn clean_text(s: &str) -> String {
    // Decode first so escaped markup (`&lt;p&gt;`) is stripped as markup.
    let decoded = html_escape::decode_html_entities(s);
    let no_tags = RE_TAGS.replace_all(&decoded, " ");
    // Stray angle brackets that were not part of a tag never reach the output.
    let no_brackets = no_tags.replace(['<', '>'], " ");
    RE_WS.replace_all(&no_brackets, " ").trim().to_string()
}

/// Summary text: `clean_text` capped to `SUMMARY_MAX_CHARS` characters.
pub fn strip_html(s: &str) -> String {
    let out = clean_text(s);
    if out.chars().count() > SUMMARY_MAX_CHARS {
        out.chars()
            .take(SUMMARY_MAX_CHARS)
            .collect::<String>()
            .trim_end()
            .to_string()
    } else {
        out
    }
}

/// First `<img src>` inside raw description/content markup.
pub fn first_img_src(html: &str) -> Option<String> {
    RE_IMG_SRC
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| html_escape::decode_html_entities(m.as_str().trim()).to_string())
        .filter(|s| !s.is_empty())
}

/// Stable item id: a pure function of the URL.
pub fn item_id(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut out = String::with_capacity(2 + 24);
    out.push_str("n-");
    for b in digest.iter().take(12) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// URL dedup key: trimmed and lower-cased.
pub fn url_key(url: &str) -> String {
    url.trim().to_lowercase()
}

/// Title dedup key: lower-cased, punctuation removed, whitespace collapsed,
/// truncated to `TITLE_KEY_MAX_CHARS` characters.
pub fn title_key(title: &str) -> String {
    let lowered = title.to_lowercase();
    let no_punct: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    let collapsed = RE_WS.replace_all(&no_punct, " ");
    collapsed.trim().chars().take(TITLE_KEY_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_strips_tags_and_entities() {
        let s = "  <p>Hello&nbsp;<b>world</b></p>\n\n &amp; more ";
        assert_eq!(clean_text(s), "Hello world & more");
    }

    #[test]
    fn escaped_markup_is_stripped_too() {
        let s = "&lt;p&gt;Intro&lt;/p&gt; text";
        assert_eq!(clean_text(s), "Intro text");
    }

    #[test]
    fn summary_is_capped() {
        let s = format!("<div>{}</div>", "word ".repeat(200));
        let out = strip_html(&s);
        assert!(out.chars().count() <= SUMMARY_MAX_CHARS);
        assert!(!out.contains('<') && !out.contains('>'));
    }

    #[test]
    fn img_src_is_found() {
        let html = r#"<p>x</p><img class="a" src="https://img.test/a.jpg?x=1&amp;y=2" />"#;
        assert_eq!(
            first_img_src(html).as_deref(),
            Some("https://img.test/a.jpg?x=1&y=2")
        );
        assert_eq!(first_img_src("<p>none</p>"), None);
    }

    #[test]
    fn id_is_deterministic() {
        let a = item_id("https://example.org/post/1");
        assert_eq!(a, item_id("https://example.org/post/1"));
        assert_ne!(a, item_id("https://example.org/post/2"));
        assert!(a.starts_with("n-"));
        assert_eq!(a.len(), 26);
    }

    #[test]
    fn title_key_ignores_case_and_punctuation() {
        assert_eq!(
            title_key("  OpenAI   releases: GPT-5!  "),
            title_key("openai releases gpt 5")
        );
        assert!(title_key(&"x".repeat(200)).chars().count() <= TITLE_KEY_MAX_CHARS);
    }
}
