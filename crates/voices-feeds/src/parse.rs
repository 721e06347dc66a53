//! RSS / Atom parsing into normalized [`Article`] records.
//!
//! A single pass over the document collects both `<item>` and `<entry>`
//! children; RSS items win and Atom entries are only returned when no titled
//! RSS item exists. Pure transformation, no I/O.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// Cap applied to descriptions after markup stripping.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Default number of records taken from a feed.
pub const DEFAULT_MAX_ITEMS: usize = 5;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub description: String,
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// RSS `<guid>` or Atom `<id>`; the video feed carries `yt:video:<id>` here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Rss,
    Atom,
}

/// Parser output, tagged with the dialect the records came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedFeed {
    Rss(Vec<Article>),
    Atom(Vec<Article>),
    Empty,
}

impl ParsedFeed {
    #[must_use]
    pub fn kind(&self) -> Option<FeedKind> {
        match self {
            ParsedFeed::Rss(_) => Some(FeedKind::Rss),
            ParsedFeed::Atom(_) => Some(FeedKind::Atom),
            ParsedFeed::Empty => None,
        }
    }

    #[must_use]
    pub fn articles(&self) -> &[Article] {
        match self {
            ParsedFeed::Rss(a) | ParsedFeed::Atom(a) => a,
            ParsedFeed::Empty => &[],
        }
    }

    #[must_use]
    pub fn into_articles(self) -> Vec<Article> {
        match self {
            ParsedFeed::Rss(a) | ParsedFeed::Atom(a) => a,
            ParsedFeed::Empty => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Description,
    Summary,
    Content,
    Link,
    PubDate,
    Published,
    Updated,
    Guid,
}

fn field_for(kind: FeedKind, name: &[u8]) -> Option<Field> {
    match (kind, name) {
        (_, b"title") => Some(Field::Title),
        (FeedKind::Rss, b"description") => Some(Field::Description),
        (FeedKind::Rss, b"link") => Some(Field::Link),
        (FeedKind::Rss, b"pubDate") => Some(Field::PubDate),
        (FeedKind::Rss, b"guid") => Some(Field::Guid),
        (FeedKind::Atom, b"summary") => Some(Field::Summary),
        (FeedKind::Atom, b"content") => Some(Field::Content),
        (FeedKind::Atom, b"published") => Some(Field::Published),
        (FeedKind::Atom, b"updated") => Some(Field::Updated),
        (FeedKind::Atom, b"id") => Some(Field::Guid),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct Draft {
    title: String,
    description: String,
    summary: String,
    content: String,
    link: String,
    alternate_href: Option<String>,
    any_href: Option<String>,
    pub_date: String,
    published: String,
    updated: String,
    guid: String,
}

impl Draft {
    fn store(&mut self, field: Field, text: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Description => &mut self.description,
            Field::Summary => &mut self.summary,
            Field::Content => &mut self.content,
            Field::Link => &mut self.link,
            Field::PubDate => &mut self.pub_date,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
            Field::Guid => &mut self.guid,
        };
        *slot = text;
    }

    fn take_link_attrs(&mut self, e: &BytesStart<'_>) {
        let mut href = None;
        let mut rel = None;
        for attr in e.attributes().flatten() {
            let value = attr
                .unescape_value()
                .map_or_else(
                    |_| String::from_utf8_lossy(attr.value.as_ref()).into_owned(),
                    std::borrow::Cow::into_owned,
                );
            match attr.key.as_ref() {
                b"href" => href = Some(value.trim().to_string()),
                b"rel" => rel = Some(value),
                _ => {}
            }
        }
        let Some(href) = href.filter(|h| !h.is_empty()) else {
            return;
        };
        let is_alternate = rel.as_deref().is_none_or(|r| r == "alternate");
        if is_alternate && self.alternate_href.is_none() {
            self.alternate_href = Some(href.clone());
        }
        if self.any_href.is_none() {
            self.any_href = Some(href);
        }
    }

    fn finish(self, kind: FeedKind) -> Option<Article> {
        let title = clean_text(&self.title);
        if title.is_empty() {
            return None;
        }

        let description = match kind {
            FeedKind::Rss => clean_text(&self.description),
            FeedKind::Atom => {
                let summary = clean_text(&self.summary);
                if summary.is_empty() {
                    clean_text(&self.content)
                } else {
                    summary
                }
            }
        };
        let description = truncate_chars(&description, DESCRIPTION_MAX_CHARS);

        let link = match kind {
            FeedKind::Rss => Some(self.link.trim().to_string()).filter(|l| !l.is_empty()),
            FeedKind::Atom => self.alternate_href.or(self.any_href),
        };

        let published_at = match kind {
            FeedKind::Rss => parse_date(&self.pub_date),
            FeedKind::Atom => parse_date(&self.published).or_else(|| parse_date(&self.updated)),
        };

        let guid = Some(self.guid.trim().to_string()).filter(|g| !g.is_empty());

        Some(Article {
            title,
            description,
            link,
            published_at,
            guid,
        })
    }
}

/// Parse feed text, keeping at most `max_items` titled records.
///
/// A document that breaks part-way through still yields the records read
/// before the break; only a document with nothing usable is an error.
///
/// # Errors
///
/// Returns [`FeedError::Xml`] when the XML is malformed before any titled
/// record was read.
pub fn parse_feed(xml: &str, max_items: usize) -> Result<ParsedFeed, FeedError> {
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.trim_text(true);
    config.check_end_names = false;

    let mut rss = Vec::new();
    let mut atom = Vec::new();

    let mut depth: usize = 0;
    let mut current: Option<(FeedKind, usize, Draft)> = None;
    let mut capture: Option<(Field, usize)> = None;
    let mut buf = String::new();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                if rss.is_empty() && atom.is_empty() {
                    return Err(FeedError::Xml(e));
                }
                tracing::debug!(error = %e, "feed XML broke after usable records; keeping them");
                break;
            }
        };

        match event {
            Event::Start(e) => {
                let name = e.name();
                let name = name.as_ref();
                if current.is_none() && (name == b"item" || name == b"entry") {
                    let kind = if name == b"item" {
                        FeedKind::Rss
                    } else {
                        FeedKind::Atom
                    };
                    current = Some((kind, depth, Draft::default()));
                } else if let Some((kind, item_depth, draft)) = current.as_mut() {
                    if capture.is_none() && depth == *item_depth + 1 {
                        if *kind == FeedKind::Atom && name == b"link" {
                            draft.take_link_attrs(&e);
                        } else if let Some(field) = field_for(*kind, name) {
                            capture = Some((field, depth));
                            buf.clear();
                        }
                    }
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if let Some((FeedKind::Atom, item_depth, draft)) = current.as_mut() {
                    if depth == *item_depth + 1 && e.name().as_ref() == b"link" {
                        draft.take_link_attrs(&e);
                    }
                }
            }
            Event::Text(e) => {
                if capture.is_some() {
                    let text = e.unescape().map_or_else(
                        |_| String::from_utf8_lossy(&e).into_owned(),
                        std::borrow::Cow::into_owned,
                    );
                    push_fragment(&mut buf, &text);
                }
            }
            Event::CData(e) => {
                if capture.is_some() {
                    push_fragment(&mut buf, &String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if let Some((field, field_depth)) = capture {
                    if field_depth == depth {
                        if let Some((_, _, draft)) = current.as_mut() {
                            draft.store(field, std::mem::take(&mut buf));
                        }
                        capture = None;
                    }
                } else if current
                    .as_ref()
                    .is_some_and(|(_, item_depth, _)| *item_depth == depth)
                {
                    if let Some((kind, _, draft)) = current.take() {
                        let target = match kind {
                            FeedKind::Rss => &mut rss,
                            FeedKind::Atom => &mut atom,
                        };
                        if target.len() < max_items {
                            if let Some(article) = draft.finish(kind) {
                                target.push(article);
                            }
                        }
                    }
                    if rss.len() >= max_items {
                        break;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(if !rss.is_empty() {
        ParsedFeed::Rss(rss)
    } else if !atom.is_empty() {
        ParsedFeed::Atom(atom)
    } else {
        ParsedFeed::Empty
    })
}

/// Convenience wrapper returning just the records.
///
/// # Errors
///
/// See [`parse_feed`].
pub fn parse_articles(xml: &str, max_items: usize) -> Result<Vec<Article>, FeedError> {
    parse_feed(xml, max_items).map(ParsedFeed::into_articles)
}

fn push_fragment(buf: &mut String, text: &str) {
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(text);
}

/// Strip HTML tags from a string and normalize whitespace.
///
/// Only complete `<...>` runs are removed, so a bare `<` in running text
/// (`5 < 6`) survives.
#[must_use]
pub fn strip_html(html: &str) -> String {
    TAG_RE
        .replace_all(html, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Markup-free, trimmed text with the handful of entities that survive
/// double-escaped HTML payloads decoded.
fn clean_text(raw: &str) -> String {
    strip_html(raw)
        .replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Parse a feed timestamp. RFC 2822 (RSS), RFC 3339 (Atom), or a bare date;
/// anything else is `None`.
#[must_use]
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
