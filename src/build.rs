//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── ContentLoader::iter()      read + parse every published item
//!     │
//!     ├── build_taxonomies()         tag/category indexes, listing order, archive
//!     │
//!     ├── render_pages()     (rayon) one page per item, layout by front matter
//!     ├── render_listings()  (rayon) home, sections, taxonomies, terms, archive
//!     │
//!     └── assemble::publish()        conflict check, staging write, swap
//! ```
//!
//! Indexes are complete before any page is rendered; the first error aborts.

use crate::{
    assemble::{self, OutputFile, PublishReport},
    config::SiteConfig,
    content::{ContentItem, ContentLoader},
    error::{Error, Result},
    log,
    render::{ContextBuilder, Listing, Renderer, listing},
    taxonomy::{archive, build_taxonomies, chronological},
};
use chrono::NaiveDateTime;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Summary of a finished build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub items: usize,
    pub listings: usize,
    pub published: PublishReport,
}

/// Build the whole site into `[build] output`.
///
/// `now` is the build start time; items dated later are treated as future.
pub fn build_site(config: &SiteConfig, now: NaiveDateTime) -> Result<BuildReport> {
    log!("content"; "loading {}", config.build.content.display());
    let items = ContentLoader::new(config, now)
        .iter()
        .collect::<Result<Vec<_>>>()?;
    log!("content"; "found {} pages", items.len());

    let sorted = chronological(&items);
    let taxonomies = build_taxonomies(&items, config);
    let archive = archive(&sorted);
    for taxonomy in taxonomies.iter() {
        log!("taxonomy"; "{}: {} terms", taxonomy.plural, taxonomy.terms.len());
    }

    let renderer = Renderer::new(config)?;
    let contexts = ContextBuilder::new(config, &sorted, &taxonomies, &archive);

    log!("render"; "rendering pages...");
    let pages = render_pages(&renderer, &contexts, &sorted)?;

    let listings = listing::plan(config, &sorted, &taxonomies);
    let listings = renderable(&renderer, listings)?;
    let rendered_listings = render_listings(&renderer, &contexts, &listings)?;

    let mut files = pages;
    files.extend(rendered_listings);
    files.extend(assemble::content_assets(config)?);
    files.extend(assemble::static_files(config)?);

    let published = assemble::publish(config, &files)?;

    Ok(BuildReport {
        items: items.len(),
        listings: listings.len(),
        published,
    })
}

fn render_pages(
    renderer: &Renderer,
    contexts: &ContextBuilder<'_>,
    sorted: &[&ContentItem],
) -> Result<Vec<OutputFile>> {
    let neighbours = neighbours(sorted);

    sorted
        .par_iter()
        .map(|item| {
            let template = renderer.template_for(item)?;
            let (newer, older) = neighbours
                .get(item.paths.relative.as_str())
                .copied()
                .unwrap_or_default();
            let context = contexts.page(item, newer, older);
            let html = renderer.render(&template, context, &item.paths.relative)?;
            Ok(OutputFile::html(
                item.paths.output.clone(),
                item.paths.relative.clone(),
                html,
            ))
        })
        .collect()
}

fn render_listings(
    renderer: &Renderer,
    contexts: &ContextBuilder<'_>,
    listings: &[Listing<'_>],
) -> Result<Vec<OutputFile>> {
    listings
        .par_iter()
        .map(|listing| {
            let source_name = listing.source_name();
            let context = contexts.listing(listing);
            let html = renderer.render(listing.kind.template(), context, &source_name)?;
            Ok(OutputFile::html(listing.output.clone(), source_name, html))
        })
        .collect()
}

/// Drop listings whose optional template is missing; a missing required one is an error.
fn renderable<'a>(renderer: &Renderer, listings: Vec<Listing<'a>>) -> Result<Vec<Listing<'a>>> {
    let mut skipped = BTreeSet::new();
    let mut kept = Vec::with_capacity(listings.len());

    for listing in listings {
        let template = listing.kind.template();
        if renderer.has_template(template) {
            kept.push(listing);
        } else if listing.kind.is_required() {
            return Err(Error::TemplateNotFound {
                layout: template.trim_end_matches(".html").to_owned(),
                source_name: listing.source_name(),
            });
        } else if skipped.insert(template) {
            log!("warn"; "no `{template}` template, skipping {} listings", listing.kind);
        }
    }

    Ok(kept)
}

type Neighbours<'a> = (Option<&'a ContentItem>, Option<&'a ContentItem>);

/// Newer and older item of every sectioned item, within its section.
fn neighbours<'a>(sorted: &[&'a ContentItem]) -> BTreeMap<&'a str, Neighbours<'a>> {
    let mut by_section: BTreeMap<&str, Vec<&ContentItem>> = BTreeMap::new();
    for item in sorted {
        if let Some(section) = &item.section {
            by_section.entry(section).or_default().push(*item);
        }
    }

    let mut map = BTreeMap::new();
    for items in by_section.values() {
        for (i, item) in items.iter().enumerate() {
            let newer = i.checked_sub(1).map(|j| items[j]);
            let older = items.get(i + 1).copied();
            map.insert(item.paths.relative.as_str(), (newer, older));
        }
    }
    map
}
