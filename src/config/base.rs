//! `[base]` section configuration.
//!
//! Contains basic site information like title, author, description, etc.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in quire.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "My Blog"
/// description = "Notes on testing and infrastructure"
/// author = "Alice"
/// url = "https://myblog.com"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title displayed in browser tab and headers.
    #[serde(default)]
    pub title: String,

    /// Default author for pages that do not declare one.
    #[serde(default = "defaults::base::author")]
    #[educe(Default = defaults::base::author())]
    pub author: String,

    /// Site description for SEO meta tags.
    #[serde(default)]
    pub description: String,

    /// Base URL used to build permalinks.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,

    /// BCP 47 language code (e.g., "en-us", "zh-Hans").
    #[serde(default = "defaults::base::language")]
    #[educe(Default = defaults::base::language())]
    pub language: String,

    /// Copyright notice for site footer.
    #[serde(default)]
    pub copyright: String,
}

impl BaseConfig {
    /// Base URL without trailing slash, empty when unset.
    pub fn url_root(&self) -> &str {
        self.url.as_deref().unwrap_or_default().trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_base_config_full() {
        let config = r#"
            [base]
            title = "Shipping Notes"
            description = "A blog about testing and devops"
            url = "https://notes.example.com"
            language = "en-gb"
            copyright = "2023 Alice"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.base.title, "Shipping Notes");
        assert_eq!(config.base.description, "A blog about testing and devops");
        assert_eq!(config.base.url, Some("https://notes.example.com".to_string()));
        assert_eq!(config.base.language, "en-gb");
        assert_eq!(config.base.copyright, "2023 Alice");
    }

    #[test]
    fn test_base_config_defaults() {
        let config = r#"
            [base]
            title = "Test"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.base.author, "<YOUR_NAME>");
        assert_eq!(config.base.language, "en-us");
        assert_eq!(config.base.url, None);
        assert_eq!(config.base.description, "");
        assert_eq!(config.base.copyright, "");
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [base]
            title = "Test"
            unknown_field = "should_fail"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn test_url_root_trims_trailing_slash() {
        let config: SiteConfig = toml::from_str(
            r#"
            [base]
            url = "https://example.com/blog/"
        "#,
        )
        .unwrap();
        assert_eq!(config.base.url_root(), "https://example.com/blog");

        let config = SiteConfig::default();
        assert_eq!(config.base.url_root(), "");
    }

    #[test]
    fn test_base_config_unicode() {
        let config = r#"
            [base]
            title = "My Blog 🚀"
            author = "René"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.base.title, "My Blog 🚀");
        assert_eq!(config.base.author, "René");
    }
}
