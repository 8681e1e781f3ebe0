// src/ingest/tagging.rs
//! Keyword tagging. Each topic owns one regex tested against the
//! lower-cased `title + summary`; every match adds its tag, in the fixed
//! order AI, Cybersecurity, Software, Research. No match means `Research`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::types::Category;

pub const DEFAULT_TAG: Category = Category::Research;

static RULES: Lazy<Vec<(Category, Regex)>> = Lazy::new(|| {
    vec![
        (
            Category::AI,
            Regex::new(
                r"\b(ai|artificial intelligence|machine learning|llms?|deep learning|generative|neural)\b",
            )
            .unwrap(),
        ),
        (
            Category::Cybersecurity,
            Regex::new(
                r"\b(security|breach|malware|phishing|ransomware|vuln\w*|cve|cryptograph\w*|exploit)\b",
            )
            .unwrap(),
        ),
        (
            Category::Software,
            Regex::new(
                r"\b(programming|software|framework|release|dev|developers?|javascript|python|rust|open source)\b",
            )
            .unwrap(),
        ),
        (
            Category::Research,
            Regex::new(r"\b(arxiv|paper|journal|study|conference|ieee|acm|research)\b").unwrap(),
        ),
    ]
});

/// Topic tags for an item. Never empty.
pub fn assign_tags(title: &str, summary: &str) -> Vec<Category> {
    let haystack = format!("{} {}", title, summary).to_lowercase();
    let mut out: Vec<Category> = RULES
        .iter()
        .filter(|(_, re)| re.is_match(&haystack))
        .map(|(cat, _)| *cat)
        .collect();
    if out.is_empty() {
        out.push(DEFAULT_TAG);
    }
    out
}
