//! Generated listing pages.
//!
//! | Listing  | URL                          | Template        |
//! |----------|------------------------------|-----------------|
//! | home     | `/`, `/page/2/`              | `index.html`    |
//! | section  | `/posts/`, `/posts/page/2/`  | `section.html`  |
//! | taxonomy | `/tags/`                     | `taxonomy.html` |
//! | term     | `/tags/rust/`                | `term.html`     |
//! | archive  | `/archives/`                 | `archive.html`  |
//!
//! Only `index.html` is required; a listing whose template is missing is
//! skipped by the renderer.

use crate::{
    config::{SiteConfig, SlugMode},
    content::ContentItem,
    taxonomy::{Taxonomies, Taxonomy},
    utils::slug::{output_file, slugify, slugify_segments, url_path},
};
use serde::Serialize;
use std::{collections::BTreeSet, fmt, path::PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Home,
    Section,
    Taxonomy,
    Term,
    Archive,
}

impl ListingKind {
    pub const fn template(self) -> &'static str {
        match self {
            Self::Home => "index.html",
            Self::Section => "section.html",
            Self::Taxonomy => "taxonomy.html",
            Self::Term => "term.html",
            Self::Archive => "archive.html",
        }
    }

    pub const fn is_required(self) -> bool {
        matches!(self, Self::Home)
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Home => "home",
            Self::Section => "section",
            Self::Taxonomy => "taxonomy",
            Self::Term => "term",
            Self::Archive => "archive",
        };
        f.write_str(name)
    }
}

/// Position of one listing page among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginator {
    /// 1-based page number.
    pub current: usize,
    pub total_pages: usize,
    /// `0` when pagination is disabled.
    pub per_page: usize,
    pub total_items: usize,
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// Term of a taxonomy as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRef {
    pub name: String,
    pub slug: String,
    pub url: String,
}

/// One generated page.
#[derive(Debug)]
pub struct Listing<'a> {
    pub kind: ListingKind,
    pub title: String,
    pub url: String,
    pub output: PathBuf,
    /// Items shown on this page, in listing order.
    pub pages: Vec<&'a ContentItem>,
    pub paginator: Paginator,
    pub section: Option<String>,
    /// Plural name of the taxonomy for taxonomy and term listings.
    pub taxonomy: Option<String>,
    pub term: Option<TermRef>,
}

impl Listing<'_> {
    /// Name used in logs and errors, e.g. `term listing /tags/rust/`.
    pub fn source_name(&self) -> String {
        format!("{} listing {}", self.kind, self.url)
    }
}

/// URL of a taxonomy term: `/<plural>/<term-slug>/`.
pub fn term_url(plural: &str, term: &str, mode: SlugMode) -> String {
    url_path(&[plural.to_owned(), term_slug(term, mode)])
}

/// Slug of a term. Never empty: falls back to safe mode, then to hex bytes.
pub fn term_slug(term: &str, mode: SlugMode) -> String {
    [mode, SlugMode::Safe]
        .into_iter()
        .map(|mode| slugify(term, mode))
        .find(|slug| !slug.is_empty())
        .unwrap_or_else(|| term.bytes().map(|b| format!("{b:02x}")).collect())
}

/// URL of the archive listing.
pub fn archive_url(config: &SiteConfig) -> String {
    url_path(&slugify_segments(
        &config.build.archive.to_string_lossy(),
        SlugMode::No,
    ))
}

/// Every listing page of the site. `sorted` must be in listing order.
pub fn plan<'a>(
    config: &SiteConfig,
    sorted: &[&'a ContentItem],
    taxonomies: &Taxonomies<'a>,
) -> Vec<Listing<'a>> {
    let per_page = config.build.paginate;
    let mut listings = vec![];

    let home: Vec<_> = sorted
        .iter()
        .copied()
        .filter(|item| item.in_main_sections(&config.build.main_sections))
        .collect();
    listings.extend(paginate("/", &home, per_page).map(|(url, pages, paginator)| Listing {
        kind: ListingKind::Home,
        title: config.base.title.clone(),
        output: output_file(&url),
        url,
        pages,
        paginator,
        section: None,
        taxonomy: None,
        term: None,
    }));

    let sections: BTreeSet<&str> = sorted.iter().filter_map(|i| i.section.as_deref()).collect();
    for section in sections {
        let items: Vec<_> = sorted
            .iter()
            .copied()
            .filter(|item| item.section.as_deref() == Some(section))
            .collect();
        let base = url_path(&[slugify(section, config.build.slug.path)]);
        listings.extend(paginate(&base, &items, per_page).map(|(url, pages, paginator)| {
            Listing {
                kind: ListingKind::Section,
                title: section.to_owned(),
                output: output_file(&url),
                url,
                pages,
                paginator,
                section: Some(section.to_owned()),
                taxonomy: None,
                term: None,
            }
        }));
    }

    for taxonomy in taxonomies.iter() {
        listings.push(taxonomy_listing(taxonomy));
        for (term, items) in &taxonomy.terms {
            let term = TermRef {
                name: term.clone(),
                slug: term_slug(term, config.build.slug.term),
                url: term_url(&taxonomy.plural, term, config.build.slug.term),
            };
            listings.extend(paginate(&term.url, items, per_page).map(|(url, pages, paginator)| {
                Listing {
                    kind: ListingKind::Term,
                    title: term.name.clone(),
                    output: output_file(&url),
                    url,
                    pages,
                    paginator,
                    section: None,
                    taxonomy: Some(taxonomy.plural.clone()),
                    term: Some(term.clone()),
                }
            }));
        }
    }

    let dated: Vec<_> = sorted.iter().copied().filter(|i| i.date.is_some()).collect();
    let url = archive_url(config);
    listings.push(Listing {
        kind: ListingKind::Archive,
        title: "Archives".to_owned(),
        output: output_file(&url),
        paginator: single_page(&url, dated.len()),
        url,
        pages: dated,
        section: None,
        taxonomy: None,
        term: None,
    });

    listings
}

fn taxonomy_listing<'a>(taxonomy: &Taxonomy<'a>) -> Listing<'a> {
    let url = url_path(&[taxonomy.plural.as_str()]);
    Listing {
        kind: ListingKind::Taxonomy,
        title: taxonomy.plural.clone(),
        output: output_file(&url),
        paginator: single_page(&url, 0),
        url,
        pages: vec![],
        section: None,
        taxonomy: Some(taxonomy.plural.clone()),
        term: None,
    }
}

fn single_page(url: &str, total_items: usize) -> Paginator {
    Paginator {
        current: 1,
        total_pages: 1,
        per_page: 0,
        total_items,
        first: url.to_owned(),
        last: url.to_owned(),
        prev: None,
        next: None,
    }
}

/// URL of page `n` under `base`; page 1 is `base` itself.
fn page_url(base: &str, n: usize) -> String {
    if n <= 1 {
        base.to_owned()
    } else {
        format!("{base}page/{n}/")
    }
}

/// Split `items` into pages of `per_page`. Always yields at least one page.
fn paginate<'a, 'b>(
    base: &'b str,
    items: &'b [&'a ContentItem],
    per_page: usize,
) -> impl Iterator<Item = (String, Vec<&'a ContentItem>, Paginator)> + 'b {
    let chunk = if per_page == 0 { items.len().max(1) } else { per_page };
    let total_pages = items.len().div_ceil(chunk).max(1);

    (1..=total_pages).map(move |n| {
        let start = ((n - 1) * chunk).min(items.len());
        let end = (n * chunk).min(items.len());
        let paginator = Paginator {
            current: n,
            total_pages,
            per_page,
            total_items: items.len(),
            first: page_url(base, 1),
            last: page_url(base, total_pages),
            prev: (n > 1).then(|| page_url(base, n - 1)),
            next: (n < total_pages).then(|| page_url(base, n + 1)),
        };
        (page_url(base, n), items[start..end].to_vec(), paginator)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        content::fixtures::item,
        taxonomy::{build_taxonomies, chronological},
    };

    fn config(paginate: usize) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.paginate = paginate;
        config
    }

    fn urls(listings: &[Listing]) -> Vec<String> {
        listings.iter().map(|l| l.url.clone()).collect()
    }

    #[test]
    fn test_plan_covers_every_listing() {
        let items = vec![
            item("posts/testing.md", Some("2023-03-01"), &["Testing"]),
            item("posts/devops.md", Some("2023-07-05"), &["DevOps"]),
            item("about.md", None, &[]),
        ];
        let config = config(10);
        let sorted = chronological(&items);
        let taxonomies = build_taxonomies(&items, &config);
        let listings = plan(&config, &sorted, &taxonomies);

        assert_eq!(
            urls(&listings),
            [
                "/",
                "/posts/",
                "/categories/",
                "/tags/",
                "/tags/devops/",
                "/tags/testing/",
                "/archives/",
            ]
        );

        let home = &listings[0];
        assert_eq!(home.kind, ListingKind::Home);
        assert_eq!(home.output, PathBuf::from("index.html"));
        let slugs: Vec<_> = home.pages.iter().map(|i| i.slug.as_str()).collect();
        assert_eq!(slugs, ["devops", "testing"]);

        let term = &listings[4];
        assert_eq!(term.kind, ListingKind::Term);
        assert_eq!(term.taxonomy.as_deref(), Some("tags"));
        assert_eq!(term.term.as_ref().unwrap().name, "DevOps");
        assert_eq!(term.output, PathBuf::from("tags/devops/index.html"));

        let archive = listings.last().unwrap();
        assert_eq!(archive.pages.len(), 2);
    }

    #[test]
    fn test_pagination() {
        let items: Vec<_> = (1..=5)
            .map(|day| item(&format!("posts/p{day}.md"), Some(format!("2023-01-0{day}").as_str()), &[]))
            .collect();
        let config = config(2);
        let sorted = chronological(&items);
        let listings = plan(&config, &sorted, &Taxonomies::default());

        let home: Vec<_> = listings.iter().filter(|l| l.kind == ListingKind::Home).collect();
        assert_eq!(home.len(), 3);
        assert_eq!(home[0].url, "/");
        assert_eq!(home[1].url, "/page/2/");
        assert_eq!(home[2].output, PathBuf::from("page/3/index.html"));
        assert_eq!(home[2].pages.len(), 1);

        let middle = &home[1].paginator;
        assert_eq!(middle.current, 2);
        assert_eq!(middle.total_pages, 3);
        assert_eq!(middle.prev.as_deref(), Some("/"));
        assert_eq!(middle.next.as_deref(), Some("/page/3/"));
        assert_eq!(middle.last, "/page/3/");

        let section: Vec<_> = listings.iter().filter(|l| l.kind == ListingKind::Section).collect();
        assert_eq!(section[1].url, "/posts/page/2/");
    }

    #[test]
    fn test_paginate_zero_is_single_page() {
        let items: Vec<_> = (1..=3)
            .map(|day| item(&format!("posts/p{day}.md"), Some(format!("2023-01-0{day}").as_str()), &[]))
            .collect();
        let sorted = chronological(&items);
        let listings = plan(&config(0), &sorted, &Taxonomies::default());
        let home: Vec<_> = listings.iter().filter(|l| l.kind == ListingKind::Home).collect();
        assert_eq!(home.len(), 1);
        assert_eq!(home[0].pages.len(), 3);
        assert_eq!(home[0].paginator.next, None);
    }

    #[test]
    fn test_empty_site_still_has_home() {
        let listings = plan(&config(10), &[], &Taxonomies::default());
        assert_eq!(urls(&listings), ["/", "/archives/"]);
        assert!(listings[0].pages.is_empty());
    }

    #[test]
    fn test_main_sections_filter_home() {
        let items = vec![
            item("posts/a.md", Some("2023-01-01"), &[]),
            item("notes/b.md", Some("2023-01-02"), &[]),
        ];
        let mut config = config(10);
        config.build.main_sections = vec!["posts".into()];
        let sorted = chronological(&items);
        let listings = plan(&config, &sorted, &Taxonomies::default());
        let slugs: Vec<_> = listings[0].pages.iter().map(|i| i.slug.as_str()).collect();
        assert_eq!(slugs, ["a"]);
    }

    #[test]
    fn test_term_slug_modes() {
        assert_eq!(term_url("tags", "Dev Ops", SlugMode::On), "/tags/dev-ops/");
        assert_eq!(term_url("tags", "Dev Ops", SlugMode::Safe), "/tags/Dev_Ops/");
        assert_eq!(term_slug("C#", SlugMode::On), "c");
        assert_eq!(term_slug("#", SlugMode::On), "23");
    }
}
