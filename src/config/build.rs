//! `[build]` section configuration.
//!
//! Contains build settings including paths, drafts, pagination, slugs, etc.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Enums
// ============================================================================

/// URL slug generation mode for paths and taxonomy terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugMode {
    /// Always convert to ASCII slug (e.g., "Hello World" → "hello-world").
    On,
    /// Only strip forbidden characters and replace whitespace (default).
    #[default]
    Safe,
    /// No slugification; preserve original text.
    No,
}

/// What happens when a template references a value missing from its context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedPolicy {
    /// Render the reference as an empty string and warn (default).
    #[default]
    Empty,
    /// Abort the build with `UndefinedReference`.
    Strict,
}

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in quire.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"      # Markdown sources
/// output = "public"        # Output directory
/// templates = "templates"  # Tera templates
/// paginate = 5
/// main_sections = ["posts"]
///
/// [build.slug]
/// path = "on"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content source directory (Markdown files).
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Tera template directory.
    #[serde(default = "defaults::build::templates")]
    #[educe(Default = defaults::build::templates())]
    pub templates: PathBuf,

    /// Files copied verbatim into the output (images, fonts, ...).
    #[serde(rename = "static", default = "defaults::build::static_dir")]
    #[educe(Default = defaults::build::static_dir())]
    pub static_dir: PathBuf,

    /// Output directory of the archive listing, relative to the output root.
    #[serde(default = "defaults::build::archive")]
    #[educe(Default = defaults::build::archive())]
    pub archive: PathBuf,

    /// Include drafts and future-dated content.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub drafts: bool,

    /// Minify HTML output.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,

    /// Drop files of the previous output that this build does not produce.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Pages per listing page; `0` puts every page on a single listing.
    #[serde(default = "defaults::build::paginate")]
    #[educe(Default = defaults::build::paginate())]
    pub paginate: usize,

    /// Word count of automatic summaries.
    #[serde(default = "defaults::build::summary_length")]
    #[educe(Default = defaults::build::summary_length())]
    pub summary_length: usize,

    /// `chrono` format string for `date_display` fields.
    #[serde(default = "defaults::build::date_format")]
    #[educe(Default = defaults::build::date_format())]
    pub date_format: String,

    /// Sections listed on the home page. Empty means every section.
    #[serde(default)]
    pub main_sections: Vec<String>,

    /// Handling of template references to absent values.
    #[serde(default)]
    pub undefined: UndefinedPolicy,

    /// URL slugification settings.
    #[serde(default)]
    pub slug: SlugConfig,
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// `[build.slug]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SlugConfig {
    /// Slugify content paths
    #[serde(default = "defaults::build::slug::path")]
    #[educe(Default = defaults::build::slug::path())]
    pub path: SlugMode,

    /// Slugify taxonomy terms in URLs
    #[serde(default = "defaults::build::slug::term")]
    #[educe(Default = defaults::build::slug::term())]
    pub term: SlugMode,
}

// ============================================================================
// Tests
// ============================================================================
