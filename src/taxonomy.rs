//! Taxonomy indexes and chronological listings.
//!
//! Built once from the full item set, before any page is rendered.
//!
//! ```text
//! items ──► build_taxonomies() ──► Taxonomies
//!   │                                 ├── tags:       { "DevOps": [b], "Testing": [a] }
//!   │                                 └── categories: { ... }
//!   └─────► chronological()  ───────► [b, a]  ──► archive() ──► [2023: [b, a]]
//! ```
//!
//! Ordering everywhere: publish date descending, undated items last, ties
//! broken by source path ascending.

use crate::{config::SiteConfig, content::ContentItem};
use chrono::Datelike;
use std::{cmp::Ordering, collections::BTreeMap};

/// Term name to items carrying that term, in listing order.
pub type TagIndex<'a> = BTreeMap<String, Vec<&'a ContentItem>>;

/// One configured taxonomy with its index.
#[derive(Debug)]
pub struct Taxonomy<'a> {
    pub singular: String,
    /// Front matter key and URL segment.
    pub plural: String,
    pub terms: TagIndex<'a>,
}

/// All taxonomies of a build, sorted by plural name.
#[derive(Debug, Default)]
pub struct Taxonomies<'a> {
    pub items: Vec<Taxonomy<'a>>,
}

impl<'a> Taxonomies<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &Taxonomy<'a>> {
        self.items.iter()
    }
}

/// Listing order of two items.
pub fn listing_order(a: &ContentItem, b: &ContentItem) -> Ordering {
    match (a.date, b.date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.paths.relative.cmp(&b.paths.relative))
}

/// Every item, in listing order.
pub fn chronological(items: &[ContentItem]) -> Vec<&ContentItem> {
    let mut sorted: Vec<_> = items.iter().collect();
    sorted.sort_by(|a, b| listing_order(a, b));
    sorted
}

/// Reverse index of one taxonomy.
///
/// Every term used by any item is a key; each term lists its items in listing order.
pub fn build_tag_index<'a>(items: &'a [ContentItem], plural: &str) -> TagIndex<'a> {
    let mut index: TagIndex<'a> = BTreeMap::new();
    for item in items {
        for term in item.terms(plural) {
            index.entry(term.to_owned()).or_default().push(item);
        }
    }
    for entries in index.values_mut() {
        entries.sort_by(|a, b| listing_order(a, b));
    }
    index
}

/// Indexes of every taxonomy declared in `[taxonomies]`.
pub fn build_taxonomies<'a>(items: &'a [ContentItem], config: &SiteConfig) -> Taxonomies<'a> {
    let mut taxonomies: Vec<_> = config
        .taxonomies
        .iter()
        .map(|(singular, plural)| Taxonomy {
            singular: singular.clone(),
            plural: plural.clone(),
            terms: build_tag_index(items, plural),
        })
        .collect();
    taxonomies.sort_by(|a, b| a.plural.cmp(&b.plural));
    Taxonomies { items: taxonomies }
}

/// Items of one year in the archive.
#[derive(Debug)]
pub struct YearGroup<'a> {
    pub year: i32,
    pub items: Vec<&'a ContentItem>,
}

/// Group dated items by year, newest year first. Expects listing order.
pub fn archive<'a>(sorted: &[&'a ContentItem]) -> Vec<YearGroup<'a>> {
    let mut groups: Vec<YearGroup<'a>> = vec![];
    for item in sorted {
        let Some(date) = item.date else { continue };
        match groups.last_mut() {
            Some(group) if group.year == date.year() => group.items.push(item),
            _ => groups.push(YearGroup {
                year: date.year(),
                items: vec![item],
            }),
        }
    }
    groups
}
