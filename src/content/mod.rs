//! Content items: Markdown files with front matter.
//!
//! # Path Mapping
//!
//! | Source | section | slug | url |
//! |--------|---------|------|-----|
//! | `posts/hello.md` | `posts` | `hello` | `/posts/hello/` |
//! | `posts/hello/index.md` | `posts` | `hello` | `/posts/hello/` |
//! | `about.md` | - | `about` | `/about/` |
//! | `posts/x.md` with `url: /x/` | `posts` | `x` | `/x/` |
//!
//! `_index.md` files carry section metadata for themes and are not loaded.

pub mod front_matter;
mod loader;
pub mod markdown;

pub use front_matter::FrontMatter;
pub use loader::ContentLoader;
pub use markdown::Rendered;

use chrono::NaiveDateTime;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
};

/// A loaded, published content file. Immutable for the rest of the build.
#[derive(Debug, Clone)]
pub struct ContentItem {
    pub paths: ItemPaths,
    /// First directory under the content root, `None` for top-level pages.
    pub section: Option<String>,
    pub slug: String,
    pub front: FrontMatter,
    pub date: Option<NaiveDateTime>,
    pub lastmod: Option<NaiveDateTime>,
    /// Terms by plural taxonomy name; every configured taxonomy has an entry.
    pub taxonomies: BTreeMap<String, BTreeSet<String>>,
    /// Raw Markdown body.
    pub body: String,
    pub rendered: Rendered,
}

/// Path and URL information of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPaths {
    /// Source path relative to the content root, `/`-separated (for logs and ordering).
    pub relative: String,
    /// Pretty URL path, e.g. `/posts/hello/`.
    pub url: String,
    /// `base.url` + `url`.
    pub permalink: String,
    /// Output file relative to the output root.
    pub output: PathBuf,
}

impl ContentItem {
    /// Terms of one taxonomy (by plural name), sorted.
    pub fn terms(&self, taxonomy: &str) -> impl Iterator<Item = &str> {
        self.taxonomies
            .get(taxonomy)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Item is listed on the home page given `main_sections`.
    pub fn in_main_sections(&self, main_sections: &[String]) -> bool {
        match &self.section {
            None => false,
            Some(section) => main_sections.is_empty() || main_sections.contains(section),
        }
    }
}
