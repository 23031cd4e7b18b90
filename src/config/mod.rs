//! Site configuration management for `quire.toml`.
//!
//! # Sections
//!
//! | Section          | Purpose                                      |
//! |------------------|----------------------------------------------|
//! | `[base]`         | Site metadata (title, author, url)           |
//! | `[build]`        | Paths, drafts, pagination, slugs             |
//! | `[menu.<name>]`  | Navigation menus                             |
//! | `[[social]]`     | Social profile links                         |
//! | `[taxonomies]`   | Taxonomy names, `singular = "plural"`        |
//! | `[params]`       | Theme parameters, free-form                  |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Blog"
//! url = "https://example.com"
//!
//! [build]
//! paginate = 5
//!
//! [[menu.main]]
//! name = "Tags"
//! url = "/tags/"
//! weight = 10
//!
//! [taxonomies]
//! tag = "tags"
//!
//! [params]
//! show_reading_time = true
//! ```

mod base;
mod build;
pub mod defaults;
mod error;
mod menu;

pub use build::{SlugMode, UndefinedPolicy};
pub use menu::{MenuEntry, SocialLink};

use base::BaseConfig;
use build::BuildConfig;
use error::ConfigError;

use crate::{cli::Cli, utils::date::is_valid_format};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing quire.toml.
///
/// Loaded once at startup and only ever shared by reference afterwards.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Navigation menus by name
    #[serde(default)]
    pub menu: BTreeMap<String, Vec<MenuEntry>>,

    /// Social profile links
    #[serde(default)]
    pub social: Vec<SocialLink>,

    /// Taxonomies, singular name to plural name (the front matter key)
    #[serde(default = "defaults::taxonomies::all")]
    #[educe(Default = defaults::taxonomies::all())]
    pub taxonomies: BTreeMap<String, String>,

    /// Theme parameters
    #[serde(default)]
    pub params: BTreeMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let mut config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        config.menu.values_mut().for_each(|entries| menu::normalize(entries));
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Plural taxonomy names (front matter keys and URL segments), sorted.
    pub fn taxonomy_names(&self) -> impl Iterator<Item = &str> {
        let mut names: Vec<&str> = self.taxonomies.values().map(String::as_str).collect();
        names.sort_unstable();
        names.into_iter()
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());
        self.update_path_with_root(&root, cli);

        let build_args = cli.build_args();
        self.build.drafts |= build_args.drafts;
        self.build.clean |= build_args.clean;
        Self::update_option(&mut self.build.minify, build_args.minify.as_ref());
        if let Some(url) = &build_args.base_url {
            self.base.url = Some(url.clone());
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path, cli: &Cli) {
        Self::update_option(&mut self.build.content, cli.content.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        let root = Self::normalize_path(root);
        self.set_root(&root);
        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.resolve_paths(&root);
    }

    /// Make every directory in `[build]` absolute under `root`.
    pub fn resolve_paths(&mut self, root: &Path) {
        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
        self.build.templates = Self::normalize_path(&root.join(&self.build.templates));
        self.build.static_dir = Self::normalize_path(&root.join(&self.build.static_dir));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before building
    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        if self.build.summary_length == 0 {
            bail!(ConfigError::Validation(
                "[build.summary_length] must be greater than 0".into()
            ));
        }

        if !is_valid_format(&self.build.date_format) {
            bail!(ConfigError::Validation(format!(
                "[build.date_format] `{}` is not a valid strftime format",
                self.build.date_format
            )));
        }

        if !self.build.content.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[build.content] not found: {}",
                self.build.content.display()
            )));
        }

        if !self.build.templates.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[build.templates] not found: {}",
                self.build.templates.display()
            )));
        }

        let mut seen = std::collections::BTreeSet::new();
        for (singular, plural) in &self.taxonomies {
            if plural.is_empty() || plural.contains(['/', '\\']) {
                bail!(ConfigError::Validation(format!(
                    "[taxonomies.{singular}] must be a plain, non-empty name"
                )));
            }
            if !seen.insert(plural) {
                bail!(ConfigError::Validation(format!(
                    "[taxonomies] `{plural}` is declared twice"
                )));
            }
        }

        Ok(())
    }
}
