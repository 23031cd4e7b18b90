//! Markdown rendering with heading anchors, table of contents and summaries.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use serde::Serialize;
use std::{borrow::Cow, collections::HashSet};

/// Everything before this marker is the summary.
pub const SUMMARY_DIVIDER: &str = "<!--more-->";

/// Average reading speed used for `reading_time`.
const WORDS_PER_MINUTE: usize = 213;

/// Table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub id: String,
    pub title: String,
}

/// Output of [`render`]. `summary` is always HTML-safe.
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub html: String,
    pub toc: Vec<Heading>,
    pub summary: String,
    /// The summary does not cover the whole body.
    pub truncated: bool,
    pub word_count: usize,
    pub reading_time: usize,
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Render a Markdown body.
///
/// Summary priority: `explicit` (escaped), then the part before
/// [`SUMMARY_DIVIDER`], then the first `summary_length` words of paragraph text.
pub fn render(body: &str, explicit: Option<&str>, summary_length: usize) -> Rendered {
    let mut events: Vec<Event> = Parser::new_ext(body, options()).collect();
    let toc = anchor_headings(&mut events);

    let word_count: usize = events
        .iter()
        .map(|event| match event {
            Event::Text(text) | Event::Code(text) => text.split_whitespace().count(),
            _ => 0,
        })
        .sum();
    let reading_time = word_count.div_ceil(WORDS_PER_MINUTE).max(1);

    let (summary, truncated) = match (explicit, body.find(SUMMARY_DIVIDER)) {
        (Some(text), _) => (html_escape(text.trim()).into_owned(), true),
        (None, Some(idx)) => {
            let mut out = String::new();
            html::push_html(&mut out, Parser::new_ext(&body[..idx], options()));
            (out.trim_end().to_owned(), true)
        }
        (None, None) => auto_summary(&events, summary_length),
    };

    let mut html_out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut html_out, events.into_iter());

    Rendered {
        html: html_out,
        toc,
        summary,
        truncated,
        word_count,
        reading_time,
    }
}

/// Give every heading an `id`, keeping explicit `{#id}` attributes.
fn anchor_headings(events: &mut [Event]) -> Vec<Heading> {
    let mut slugger = Slugger::default();
    let mut toc = vec![];

    for i in 0..events.len() {
        let replacement = match &events[i] {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let end = find_heading_end(events, i);
                let title = text_of(&events[i + 1..end]);
                let anchor = match id {
                    Some(id) => slugger.reserve(id),
                    None => slugger.slugify(&title),
                };
                toc.push(Heading {
                    level: *level as u8,
                    id: anchor.clone(),
                    title,
                });
                Some(Event::Start(Tag::Heading {
                    level: *level,
                    id: Some(CowStr::from(anchor)),
                    classes: classes.clone(),
                    attrs: attrs.clone(),
                }))
            }
            _ => None,
        };
        if let Some(event) = replacement {
            events[i] = event;
        }
    }

    toc
}

fn find_heading_end(events: &[Event], start: usize) -> usize {
    events[start..]
        .iter()
        .position(|event| matches!(event, Event::End(TagEnd::Heading(_))))
        .map_or(events.len(), |offset| start + offset)
}

fn text_of(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        if let Event::Text(t) | Event::Code(t) = event {
            text.push_str(t);
        }
    }
    text
}

/// First `limit` words of paragraph text, escaped.
fn auto_summary(events: &[Event], limit: usize) -> (String, bool) {
    let mut words = vec![];
    let mut total = 0;
    let mut depth = 0usize;

    for event in events {
        match event {
            Event::Start(Tag::Paragraph) => depth += 1,
            Event::End(TagEnd::Paragraph) => depth = depth.saturating_sub(1),
            Event::Text(text) | Event::Code(text) if depth > 0 => {
                for word in text.split_whitespace() {
                    total += 1;
                    if words.len() < limit {
                        words.push(word);
                    }
                }
            }
            _ => {}
        }
    }

    let truncated = total > words.len();
    let mut summary = html_escape(&words.join(" ")).into_owned();
    if truncated {
        summary.push('…');
    }
    (summary, truncated)
}

/// Deduplicating heading slugger: repeated titles get `-1`, `-2`, ...
#[derive(Default)]
struct Slugger {
    seen: HashSet<String>,
}

impl Slugger {
    fn slugify(&mut self, text: &str) -> String {
        let base = match slug::slugify(text) {
            s if s.is_empty() => "heading".to_owned(),
            s => s,
        };
        let mut candidate = base.clone();
        let mut counter = 1;
        while self.seen.contains(&candidate) {
            candidate = format!("{base}-{counter}");
            counter += 1;
        }
        self.seen.insert(candidate.clone());
        candidate
    }

    fn reserve(&mut self, id: &str) -> String {
        self.seen.insert(id.to_owned());
        id.to_owned()
    }
}

/// Escape text for HTML element content and attribute values.
pub fn html_escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"']) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let out = render("Hello *world*\n", None, 70);
        assert_eq!(out.html, "<p>Hello <em>world</em></p>\n");
        assert_eq!(out.word_count, 2);
        assert_eq!(out.reading_time, 1);
    }

    #[test]
    fn test_heading_ids_and_toc() {
        let out = render("# Intro\n\n## Setup\n\n## Setup\n\n## Custom {#mine}\n", None, 70);

        assert!(out.html.contains(r#"<h1 id="intro">Intro</h1>"#));
        assert!(out.html.contains(r#"<h2 id="setup">Setup</h2>"#));
        assert!(out.html.contains(r#"<h2 id="setup-1">Setup</h2>"#));
        assert!(out.html.contains(r#"<h2 id="mine">Custom</h2>"#));

        let ids: Vec<_> = out.toc.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["intro", "setup", "setup-1", "mine"]);
        assert_eq!(out.toc[0].level, 1);
        assert_eq!(out.toc[1].level, 2);
    }

    #[test]
    fn test_heading_with_inline_code() {
        let out = render("## Using `cargo`\n", None, 70);
        assert_eq!(out.toc[0].title, "Using cargo");
        assert_eq!(out.toc[0].id, "using-cargo");
    }

    #[test]
    fn test_explicit_summary_is_escaped() {
        let out = render("Body text.\n", Some("Fast <b>builds</b>"), 70);
        assert_eq!(out.summary, "Fast &lt;b&gt;builds&lt;/b&gt;");
    }

    #[test]
    fn test_divider_summary() {
        let out = render("Intro **bold**.\n\n<!--more-->\n\nRest.\n", None, 70);
        assert_eq!(out.summary, "<p>Intro <strong>bold</strong>.</p>");
        assert!(out.truncated);
        assert!(out.html.contains("Rest."));
    }

    #[test]
    fn test_auto_summary_truncates() {
        let out = render("one two three four five\n", None, 3);
        assert_eq!(out.summary, "one two three…");
        assert!(out.truncated);

        let out = render("# Title\n\nshort text\n", None, 3);
        assert_eq!(out.summary, "short text");
        assert!(!out.truncated);
    }

    #[test]
    fn test_extensions_enabled() {
        let out = render("| a |\n|---|\n| b |\n\n~~gone~~\n\n- [x] done\n", None, 70);
        assert!(out.html.contains("<table>"));
        assert!(out.html.contains("<del>gone</del>"));
        assert!(out.html.contains("checkbox"));
    }

    #[test]
    fn test_reading_time_rounds_up() {
        let body = "word ".repeat(214);
        let out = render(&body, None, 70);
        assert_eq!(out.word_count, 214);
        assert_eq!(out.reading_time, 2);
    }

    #[test]
    fn test_html_escape() {
        assert!(matches!(html_escape("plain"), Cow::Borrowed("plain")));
        assert_eq!(html_escape("a & \"b\""), "a &amp; &quot;b&quot;");
    }
}
