//! Content discovery and loading.
//!
//! [`ContentLoader::iter`] walks the content root in file-name order and
//! yields one `Result<ContentItem>` per published Markdown file. Nothing is
//! read until the iterator is advanced.

use super::{ContentItem, ItemPaths, front_matter, markdown};
use crate::{
    config::SiteConfig,
    error::{Error, Result},
    utils::{
        date::parse_date,
        slug::{output_file, slugify, slugify_segments, url_path},
    },
};
use chrono::NaiveDateTime;
use std::{fs, io, path::Path};
use walkdir::{DirEntry, WalkDir};

/// Markdown file extensions
const EXTENSIONS: &[&str] = &["md", "markdown"];

/// Section metadata files, not content items
const SECTION_STEM: &str = "_index";

/// Leaf bundle entry file: `posts/hello/index.md` is the page `posts/hello`
const BUNDLE_STEM: &str = "index";

pub struct ContentLoader<'a> {
    config: &'a SiteConfig,
    /// Build start time; later dates are "future".
    now: NaiveDateTime,
}

impl<'a> ContentLoader<'a> {
    pub const fn new(config: &'a SiteConfig, now: NaiveDateTime) -> Self {
        Self { config, now }
    }

    /// Lazily load every published item under the content root.
    ///
    /// Drafts and future-dated items are skipped unless `[build] drafts` is set.
    pub fn iter(&self) -> impl Iterator<Item = Result<ContentItem>> + '_ {
        let root = &self.config.build.content;
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
            .filter_map(move |entry| match entry {
                Err(err) => {
                    let path = err.path().unwrap_or(root.as_path()).to_path_buf();
                    Some(Err(Error::io(path, io::Error::other(err))))
                }
                Ok(entry) if is_content_file(&entry) => self.load(entry.path()).transpose(),
                Ok(_) => None,
            })
    }

    /// Load one file. `Ok(None)` means the item is excluded as draft or future.
    pub fn load(&self, path: &Path) -> Result<Option<ContentItem>> {
        let source = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;

        let split = front_matter::split(&source).map_err(|msg| Error::malformed(path, msg))?;
        let meta = front_matter::parse(split.header, self.config.taxonomy_names())
            .map_err(|msg| Error::malformed(path, msg))?;
        let front = meta.front;

        let date = parse_optional_date(path, "date", front.date.as_deref())?;
        let lastmod = parse_optional_date(path, "lastmod", front.lastmod.as_deref())?;

        if !self.is_published(front.draft, date) {
            return Ok(None);
        }

        let relative = path
            .strip_prefix(&self.config.build.content)
            .map_err(|_| Error::malformed(path, "file is not in the content directory"))?;
        let location = Location::from_relative(relative, front.slug.as_deref(), self.config);

        let url = match &front.url {
            Some(url) => url_path(&slugify_segments(url, self.config.build.slug.path)),
            None => location.url.clone(),
        };

        let rendered = markdown::render(
            split.body,
            front.summary.as_deref(),
            self.config.build.summary_length,
        );

        Ok(Some(ContentItem {
            paths: ItemPaths {
                relative: location.relative,
                output: output_file(&url),
                permalink: format!("{}{url}", self.config.base.url_root()),
                url,
            },
            section: location.section,
            slug: location.slug,
            date,
            lastmod,
            taxonomies: meta.taxonomies,
            body: split.body.to_owned(),
            rendered,
            front,
        }))
    }

    fn is_published(&self, draft: bool, date: Option<NaiveDateTime>) -> bool {
        self.config.build.drafts || (!draft && date.is_none_or(|date| date <= self.now))
    }
}

/// Where an item lives, derived from its source path.
struct Location {
    relative: String,
    section: Option<String>,
    slug: String,
    url: String,
}

impl Location {
    fn from_relative(relative: &Path, slug: Option<&str>, config: &SiteConfig) -> Self {
        let mode = config.build.slug.path;
        let mut parts: Vec<String> = relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        if parts.last().is_some_and(|stem| stem == BUNDLE_STEM) {
            parts.pop();
        }

        let section = (parts.len() > 1).then(|| parts[0].clone());
        let slug = match (slug, parts.last()) {
            (Some(explicit), _) => slugify(explicit, mode),
            (None, Some(stem)) => slugify(stem, mode),
            (None, None) => String::new(),
        };

        let mut segments: Vec<String> = parts
            .iter()
            .take(parts.len().saturating_sub(1))
            .map(|dir| slugify(dir, mode))
            .collect();
        if !slug.is_empty() {
            segments.push(slug.clone());
        }

        Self {
            relative: relative.to_string_lossy().replace('\\', "/"),
            section,
            slug,
            url: url_path(&segments),
        }
    }
}

fn parse_optional_date(path: &Path, field: &str, value: Option<&str>) -> Result<Option<NaiveDateTime>> {
    value
        .map(|raw| {
            parse_date(raw).ok_or_else(|| Error::malformed(path, format!("invalid {field} `{raw}`")))
        })
        .transpose()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn is_content_file(entry: &DirEntry) -> bool {
    let path = entry.path();
    entry.file_type().is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| EXTENSIONS.contains(&ext))
        && path.file_stem().is_some_and(|stem| stem != SECTION_STEM)
}
