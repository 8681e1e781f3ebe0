// src/ingest/types.rs
use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Topical classification. Used both as a source's static category and as
/// a keyword-derived tag on items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    AI,
    Cybersecurity,
    Software,
    Research,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::AI,
        Category::Cybersecurity,
        Category::Software,
        Category::Research,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::AI => "AI",
            Category::Cybersecurity => "Cybersecurity",
            Category::Software => "Software",
            Category::Research => "Research",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Local,
    International,
}

impl Region {
    pub fn as_str(self) -> &'static str {
        match self {
            Region::Local => "local",
            Region::International => "international",
        }
    }
}

/// One configured feed endpoint. Immutable once the registry is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub url: String,
    pub name: String,
    pub category: Category,
    pub region: Region,
}

impl FeedSource {
    pub fn new(url: &str, name: &str, category: Category, region: Region) -> Self {
        Self {
            url: url.to_string(),
            name: name.to_string(),
            category,
            region,
        }
    }
}

/// Body of a successful fetch, before shape detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload {
    pub body: String,
    pub content_type: Option<String>,
}

impl RawPayload {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Best-effort interpretation of an item's timestamp string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishedAt {
    At(DateTime<Utc>),
    Unparsable,
}

impl PublishedAt {
    /// Accepts RFC 2822 (RSS), RFC 3339 (Atom, JSON APIs) and a couple of
    /// naive layouts seen in the wild (interpreted as UTC).
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return PublishedAt::Unparsable;
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
            return PublishedAt::At(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return PublishedAt::At(dt.with_timezone(&Utc));
        }
        for layout in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
                return PublishedAt::At(Utc.from_utc_datetime(&naive));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return PublishedAt::At(Utc.from_utc_datetime(&naive));
            }
        }
        PublishedAt::Unparsable
    }

    /// Newest first; every parsed date sorts before every unparsable one.
    pub fn newest_first(a: &Self, b: &Self) -> Ordering {
        match (a, b) {
            (PublishedAt::At(x), PublishedAt::At(y)) => y.cmp(x),
            (PublishedAt::At(_), PublishedAt::Unparsable) => Ordering::Less,
            (PublishedAt::Unparsable, PublishedAt::At(_)) => Ordering::Greater,
            (PublishedAt::Unparsable, PublishedAt::Unparsable) => Ordering::Equal,
        }
    }
}

/// Uniform representation of one news item after parsing.
///
/// `title` and `url` are never empty and `category_tags` always holds at
/// least one tag; the parser discards anything that cannot satisfy that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source_name: String,
    pub published_at: String,
    pub summary: String,
    pub image: Option<String>,
    pub category: Category,
    pub region: Region,
    pub category_tags: Vec<Category>,
}

impl NormalizedItem {
    pub fn published(&self) -> PublishedAt {
        PublishedAt::parse(&self.published_at)
    }

    pub fn has_tag(&self, tag: Category) -> bool {
        self.category_tags.contains(&tag)
    }
}

/// Item shape handed to the page layer. `category` is the first keyword
/// tag, not the source's static category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: String,
    pub summary: String,
    pub image: Option<String>,
    pub region: Region,
    pub category: Category,
    pub category_tags: Vec<Category>,
}

impl From<&NormalizedItem> for FrontendItem {
    fn from(it: &NormalizedItem) -> Self {
        Self {
            id: it.id.clone(),
            title: it.title.clone(),
            url: it.url.clone(),
            source: it.source_name.clone(),
            published_at: it.published_at.clone(),
            summary: it.summary.clone(),
            image: it.image.clone(),
            region: it.region,
            category: it
                .category_tags
                .first()
                .copied()
                .unwrap_or(Category::Research),
            category_tags: it.category_tags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rss_and_atom_dates() {
        assert!(matches!(
            PublishedAt::parse("Tue, 10 Jun 2025 08:30:00 GMT"),
            PublishedAt::At(_)
        ));
        assert!(matches!(
            PublishedAt::parse("2025-06-10T08:30:00Z"),
            PublishedAt::At(_)
        ));
        assert!(matches!(
            PublishedAt::parse("2025-06-10T08:30:00.000+02:00"),
            PublishedAt::At(_)
        ));
        assert_eq!(PublishedAt::parse(""), PublishedAt::Unparsable);
        assert_eq!(PublishedAt::parse("yesterday-ish"), PublishedAt::Unparsable);
    }

    #[test]
    fn unparsable_sorts_last() {
        let a = PublishedAt::parse("2025-01-01T00:00:00Z");
        let b = PublishedAt::parse("2024-01-01T00:00:00Z");
        let u = PublishedAt::Unparsable;
        assert_eq!(PublishedAt::newest_first(&a, &b), Ordering::Less);
        assert_eq!(PublishedAt::newest_first(&b, &a), Ordering::Greater);
        assert_eq!(PublishedAt::newest_first(&u, &b), Ordering::Greater);
        assert_eq!(PublishedAt::newest_first(&a, &u), Ordering::Less);
        assert_eq!(PublishedAt::newest_first(&u, &u), Ordering::Equal);
    }

    #[test]
    fn category_names_are_case_insensitive() {
        assert_eq!(Category::from_name("ai"), Some(Category::AI));
        assert_eq!(
            Category::from_name(" CyberSecurity "),
            Some(Category::Cybersecurity)
        );
        assert_eq!(Category::from_name("Robotics"), None);
    }

    #[test]
    fn frontend_category_is_first_tag() {
        let it = NormalizedItem {
            id: "n-1".into(),
            title: "t".into(),
            url: "https://x.test/a".into(),
            source_name: "X".into(),
            published_at: String::new(),
            summary: String::new(),
            image: None,
            category: Category::Research,
            region: Region::Local,
            category_tags: vec![Category::Cybersecurity, Category::AI],
        };
        let f = FrontendItem::from(&it);
        assert_eq!(f.category, Category::Cybersecurity);
        assert_eq!(f.source, "X");
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["categoryTags"][1], "AI");
        assert_eq!(v["region"], "local");
        assert!(v.get("publishedAt").is_some());
    }
}
