// src/ingest/parser.rs
//! Payload → `NormalizedItem`s.
//!
//! The document shape is sniffed first (`DocumentShape`), then one of three
//! extractors runs: RSS (2.0 and 1.0/RDF), Atom, or JSON search results.
//! XML is read with `quick_xml` into a small element tree so every field is
//! pulled out by an explicit `Option`-returning accessor.

use metrics::counter;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Deserialize;

use crate::ingest::tagging::assign_tags;
use crate::ingest::types::{FeedSource, NormalizedItem, RawPayload};
use crate::ingest::{clean_text, first_img_src, item_id, strip_html};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed xml: {0}")]
    Xml(String),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unrecognized document shape")]
    Unrecognized,
}

impl From<quick_xml::Error> for ParseError {
    fn from(e: quick_xml::Error) -> Self {
        ParseError::Xml(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    Rss,
    Atom,
    Json,
    Unrecognized,
}

/// Parse one source's payload. Never fails: a payload that cannot be read
/// contributes no items.
pub fn parse(payload: &RawPayload, source: &FeedSource) -> Vec<NormalizedItem> {
    match try_parse_payload(payload, source) {
        Ok(items) => {
            counter!("news_items_parsed_total").increment(items.len() as u64);
            items
        }
        Err(e) => {
            tracing::warn!(
                source = %source.name,
                content_type = payload.content_type.as_deref().unwrap_or("-"),
                error = %e,
                "feed parse failed"
            );
            counter!("news_parse_failures_total").increment(1);
            Vec::new()
        }
    }
}

/// Parse a fetched payload, letting its `Content-Type` settle the shape
/// when the body alone is inconclusive.
pub fn try_parse_payload(
    payload: &RawPayload,
    source: &FeedSource,
) -> Result<Vec<NormalizedItem>, ParseError> {
    let shape = detect_shape_hinted(&payload.body, payload.content_type.as_deref());
    parse_as(shape, &payload.body, source)
}

pub fn try_parse(body: &str, source: &FeedSource) -> Result<Vec<NormalizedItem>, ParseError> {
    parse_as(detect_shape(body), body, source)
}

fn parse_as(
    shape: DocumentShape,
    body: &str,
    source: &FeedSource,
) -> Result<Vec<NormalizedItem>, ParseError> {
    let body = body.trim_start_matches('\u{feff}');
    match shape {
        DocumentShape::Rss => Ok(rss::items(&read_tree(body)?, source)),
        DocumentShape::Atom => Ok(atom::items(&read_tree(body)?, source)),
        DocumentShape::Json => json::items(body, source),
        DocumentShape::Unrecognized => Err(ParseError::Unrecognized),
    }
}

/// Body sniffing first; a JSON media type claims a body the sniffer could
/// not place, so it is reported as malformed JSON rather than unknown.
pub fn detect_shape_hinted(body: &str, content_type: Option<&str>) -> DocumentShape {
    match detect_shape(body) {
        DocumentShape::Unrecognized
            if content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("json")) =>
        {
            DocumentShape::Json
        }
        shape => shape,
    }
}

/// Cheap shape sniffing: JSON by its first byte, XML by its root element.
pub fn detect_shape(body: &str) -> DocumentShape {
    let trimmed = body.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with('{') {
        return DocumentShape::Json;
    }
    if !trimmed.starts_with('<') {
        return DocumentShape::Unrecognized;
    }
    let mut reader = Reader::from_str(trimmed);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return match local_name(&qualified_name(&e)) {
                    "rss" | "RDF" => DocumentShape::Rss,
                    "feed" => DocumentShape::Atom,
                    _ => DocumentShape::Unrecognized,
                };
            }
            Ok(Event::Eof) | Err(_) => return DocumentShape::Unrecognized,
            Ok(_) => {}
        }
    }
}

/// Shared constructor: enforces the non-empty title/url rule and derives
/// id, summary, image fallback and tags.
fn build_item(
    source: &FeedSource,
    raw_title: &str,
    raw_link: &str,
    published_at: Option<String>,
    body_html: &str,
    explicit_image: Option<String>,
) -> Option<NormalizedItem> {
    let title = clean_text(raw_title);
    let url = raw_link.trim().to_string();
    if title.is_empty() || url.is_empty() {
        return None;
    }
    let summary = strip_html(body_html);
    let image = explicit_image
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| first_img_src(body_html));
    let category_tags = assign_tags(&title, &summary);
    Some(NormalizedItem {
        id: item_id(&url),
        title,
        url,
        source_name: source.name.clone(),
        published_at: published_at.map(|s| s.trim().to_string()).unwrap_or_default(),
        summary,
        image,
        category: source.category,
        region: source.region,
        category_tags,
    })
}

// ------------------------------------------------------------
// Element tree
// ------------------------------------------------------------

/// Element content in document order.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Text(String),
    El(Element),
}

#[derive(Debug, Default, Clone)]
pub(crate) struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    nodes: Vec<Node>,
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn qualified_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

impl Element {
    fn from_start(e: &BytesStart<'_>) -> Self {
        let attrs = e
            .attributes()
            .flatten()
            .map(|a| {
                let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
                let value = match a.unescape_value() {
                    Ok(v) => v.into_owned(),
                    Err(_) => html_escape::decode_html_entities(&String::from_utf8_lossy(&a.value))
                        .into_owned(),
                };
                (key, value)
            })
            .collect();
        Self {
            name: qualified_name(e),
            attrs,
            ..Default::default()
        }
    }

    fn local(&self) -> &str {
        local_name(&self.name)
    }

    fn push_text(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        // CDATA next to plain text continues the same run.
        match self.nodes.last_mut() {
            Some(Node::Text(prev)) => prev.push_str(s),
            _ => self.nodes.push(Node::Text(s.to_string())),
        }
    }

    fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.nodes.iter().filter_map(|n| match n {
            Node::El(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Child by exact qualified name (`link`, `media:thumbnail`).
    fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |c| c.name == name)
    }

    /// Child by local name, ignoring any namespace prefix.
    fn child_local(&self, local: &str) -> Option<&Element> {
        self.elements().find(|c| c.local() == local)
    }

    fn children_local<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |c| c.local() == local)
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Own text only (child elements skipped), trimmed; `None` when blank.
    fn text(&self) -> Option<String> {
        let own: String = self
            .nodes
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::El(_) => None,
            })
            .collect();
        let t = own.trim();
        (!t.is_empty()).then(|| t.to_string())
    }

    /// Text of this element and all descendants in document order. Element
    /// boundaries become spaces, the same way tag stripping treats markup;
    /// callers collapse whitespace.
    fn inner_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for n in &self.nodes {
            match n {
                Node::Text(t) => out.push_str(t),
                Node::El(e) => {
                    out.push(' ');
                    e.collect_text(out);
                    out.push(' ');
                }
            }
        }
    }

    fn find_descendant(&self, local: &str) -> Option<&Element> {
        for c in self.elements() {
            if c.local() == local {
                return Some(c);
            }
            if let Some(hit) = c.find_descendant(local) {
                return Some(hit);
            }
        }
        None
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) {
    match stack.last_mut() {
        Some(parent) => parent.nodes.push(Node::El(el)),
        None => {
            if root.is_none() {
                *root = Some(el);
            }
        }
    }
}

/// Read a whole XML document into an element tree; returns the root.
/// Text is kept untrimmed so word boundaries around inline markup survive.
pub(crate) fn read_tree(xml: &str) -> Result<Element, ParseError> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(Element::from_start(&e)),
            Event::Empty(e) => attach(&mut stack, &mut root, Element::from_start(&e)),
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| ParseError::Xml("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, el);
            }
            Event::Text(t) => {
                if let Some(cur) = stack.last_mut() {
                    let s = match t.unescape() {
                        Ok(s) => s.into_owned(),
                        // HTML entities (&nbsp; &mdash; …) are not XML entities.
                        Err(_) => html_escape::decode_html_entities(&String::from_utf8_lossy(&t))
                            .into_owned(),
                    };
                    cur.push_text(&s);
                }
            }
            Event::CData(c) => {
                if let Some(cur) = stack.last_mut() {
                    cur.push_text(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ParseError::Xml(format!(
            "unexpected end of document inside <{}>",
            stack.last().map(|e| e.name.as_str()).unwrap_or_default()
        )));
    }
    root.ok_or_else(|| ParseError::Xml("empty document".into()))
}

fn is_http_url(s: &str) -> bool {
    let s = s.trim().to_ascii_lowercase();
    s.starts_with("http://") || s.starts_with("https://")
}

/// `media:content` / `media:thumbnail` URL, also looking inside `media:group`.
fn media_image(el: &Element) -> Option<String> {
    let direct = el
        .children_named("media:thumbnail")
        .chain(el.children_named("media:content").filter(|m| {
            let medium_ok = m.attr("medium").map_or(true, |v| v == "image");
            let type_ok = m.attr("type").map_or(true, |v| v.starts_with("image/"));
            medium_ok && type_ok
        }))
        .find_map(|m| m.attr("url").filter(|u| !u.trim().is_empty()))
        .map(str::to_string);
    direct.or_else(|| el.child("media:group").and_then(media_image))
}

/// First `<img src>` inside a body element: a real child element (XHTML)
/// or escaped markup in its text.
fn inline_img(el: &Element) -> Option<String> {
    el.find_descendant("img")
        .and_then(|img| img.attr("src"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| first_img_src(&el.inner_text()))
}

mod rss {
    use super::*;

    pub(super) fn items(root: &Element, source: &FeedSource) -> Vec<NormalizedItem> {
        // RSS 2.0 nests items in <channel>; RSS 1.0 (RDF) puts them beside it.
        let channel_items = root
            .child_local("channel")
            .into_iter()
            .flat_map(|ch| ch.children_local("item"));
        let rdf_items = root.children_local("item");

        channel_items
            .chain(rdf_items)
            .filter_map(|it| {
                let (description, desc_el) = description(it);
                // explicit enclosure/media first, then an <img> element
                // inside XHTML description markup
                let explicit = image(it).or_else(|| desc_el.and_then(inline_img));
                build_item(
                    source,
                    &title(it).unwrap_or_default(),
                    &link(it).unwrap_or_default(),
                    published(it),
                    &description,
                    explicit,
                )
                .map(|mut item| {
                    // Image fallback also looks at full content when the
                    // description carried none.
                    if item.image.is_none() {
                        item.image = it.child("content:encoded").and_then(inline_img);
                    }
                    item
                })
            })
            .collect()
    }

    fn title(it: &Element) -> Option<String> {
        it.child("title").map(Element::inner_text)
    }

    fn link(it: &Element) -> Option<String> {
        it.children_named("link")
            .find_map(|l| l.text().or_else(|| l.attr("href").map(str::to_string)))
            .or_else(|| {
                it.child("atom:link")
                    .and_then(|l| l.attr("href"))
                    .map(str::to_string)
            })
            .or_else(|| {
                it.child("guid")
                    .and_then(Element::text)
                    .filter(|g| is_http_url(g))
            })
            .or_else(|| it.attr("rdf:about").filter(|a| is_http_url(a)).map(str::to_string))
    }

    fn published(it: &Element) -> Option<String> {
        ["pubDate", "dc:date", "published", "updated"]
            .iter()
            .find_map(|n| it.child(n).and_then(Element::text))
    }

    /// Description markup in document order (content:encoded when the
    /// description is blank) and its element.
    fn description(it: &Element) -> (String, Option<&Element>) {
        for name in ["description", "content:encoded"] {
            if let Some(el) = it.child(name) {
                let text = el.inner_text();
                if !text.trim().is_empty() {
                    return (text, Some(el));
                }
            }
        }
        (String::new(), None)
    }

    fn image(it: &Element) -> Option<String> {
        it.children_named("enclosure")
            .filter(|e| e.attr("type").map_or(true, |t| t.starts_with("image/")))
            .find_map(|e| e.attr("url").filter(|u| !u.trim().is_empty()))
            .map(str::to_string)
            .or_else(|| media_image(it))
    }
}

mod atom {
    use super::*;

    pub(super) fn items(root: &Element, source: &FeedSource) -> Vec<NormalizedItem> {
        root.children_local("entry")
            .filter_map(|e| {
                let (body, body_el) = body(e);
                let explicit = media_image(e).or_else(|| body_el.and_then(inline_img));
                build_item(
                    source,
                    &e.child_local("title").map(Element::inner_text).unwrap_or_default(),
                    &link(e).unwrap_or_default(),
                    published(e),
                    &body,
                    explicit,
                )
            })
            .collect()
    }

    /// href of the first link whose rel is not `self`; the first link otherwise.
    fn link(e: &Element) -> Option<String> {
        let links: Vec<&Element> = e.children_local("link").collect();
        links
            .iter()
            .find(|l| l.attr("rel") != Some("self"))
            .or(links.first())
            .and_then(|l| l.attr("href").map(str::to_string).or_else(|| l.text()))
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
    }

    fn published(e: &Element) -> Option<String> {
        ["updated", "published"]
            .iter()
            .find_map(|n| e.child_local(n).and_then(Element::text))
    }

    /// Summary markup (or content when summary is empty) and its element.
    fn body(e: &Element) -> (String, Option<&Element>) {
        for name in ["summary", "content"] {
            if let Some(el) = e.child_local(name) {
                let text = el.inner_text();
                if !text.trim().is_empty() {
                    return (text, Some(el));
                }
            }
        }
        (String::new(), None)
    }
}

mod json {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct SearchResponse {
        #[serde(default)]
        hits: Vec<SearchHit>,
    }

    #[derive(Debug, Deserialize)]
    struct SearchHit {
        #[serde(rename = "objectID", default)]
        object_id: Option<String>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        story_url: Option<String>,
        #[serde(default)]
        created_at: Option<String>,
        #[serde(default)]
        story_text: Option<String>,
        #[serde(rename = "_highlightResult", default)]
        highlight: Option<Highlight>,
    }

    #[derive(Debug, Deserialize)]
    struct Highlight {
        #[serde(default)]
        story_title: Option<HighlightField>,
    }

    #[derive(Debug, Deserialize)]
    struct HighlightField {
        #[serde(default)]
        value: Option<String>,
    }

    pub(super) fn items(body: &str, source: &FeedSource) -> Result<Vec<NormalizedItem>, ParseError> {
        let resp: SearchResponse = serde_json::from_str(body)?;
        Ok(resp
            .hits
            .into_iter()
            .filter_map(|h| {
                let title = h
                    .highlight
                    .and_then(|hl| hl.story_title)
                    .and_then(|f| f.value)
                    .filter(|v| !v.trim().is_empty())
                    .or(h.title)
                    .unwrap_or_default();
                let link = h
                    .url
                    .filter(|u| !u.trim().is_empty())
                    .or(h.story_url.filter(|u| !u.trim().is_empty()))
                    .or_else(|| {
                        h.object_id
                            .as_deref()
                            .map(|id| format!("https://news.ycombinator.com/item?id={}", id))
                    })
                    .unwrap_or_default();
                build_item(
                    source,
                    &title,
                    &link,
                    h.created_at,
                    h.story_text.as_deref().unwrap_or_default(),
                    None,
                )
            })
            .collect())
    }
}
