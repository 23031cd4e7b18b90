//! `[menu]` and `[[social]]` sections.
//!
//! Menus are keyed by name (`[[menu.main]]`, `[[menu.footer]]`, ...) and kept
//! sorted by weight, then name, so templates can iterate them directly.

use serde::{Deserialize, Serialize};

/// One navigation entry.
///
/// # Example
/// ```toml
/// [[menu.main]]
/// identifier = "tags"
/// name = "Tags"
/// url = "/tags/"
/// weight = 20
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuEntry {
    /// Stable identifier, defaults to the lowercased name.
    #[serde(default)]
    pub identifier: String,
    /// Display name.
    pub name: String,
    /// Target path or absolute URL.
    pub url: String,
    /// Sort weight, lighter entries first.
    #[serde(default)]
    pub weight: i64,
}

/// Link to a profile elsewhere, rendered by the theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocialLink {
    pub name: String,
    pub url: String,
}

/// Fill missing identifiers and sort entries by `(weight, name)`.
pub fn normalize(entries: &mut [MenuEntry]) {
    for entry in entries.iter_mut() {
        if entry.identifier.is_empty() {
            entry.identifier = entry.name.to_lowercase();
        }
    }
    entries.sort_by(|a, b| a.weight.cmp(&b.weight).then_with(|| a.name.cmp(&b.name)));
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_menu_sorted_by_weight_then_name() {
        let config = SiteConfig::from_str(
            r#"
            [[menu.main]]
            name = "Tags"
            url = "/tags/"
            weight = 20

            [[menu.main]]
            name = "Archive"
            url = "/archives/"
            weight = 10

            [[menu.main]]
            identifier = "about-me"
            name = "About"
            url = "/about/"
            weight = 20
        "#,
        )
        .unwrap();

        let main = &config.menu["main"];
        let names: Vec<_> = main.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Archive", "About", "Tags"]);
        assert_eq!(main[0].identifier, "archive");
        assert_eq!(main[1].identifier, "about-me");
    }

    #[test]
    fn test_social_links() {
        let config = SiteConfig::from_str(
            r#"
            [[social]]
            name = "github"
            url = "https://github.com/alice"
        "#,
        )
        .unwrap();

        assert_eq!(config.social.len(), 1);
        assert_eq!(config.social[0].url, "https://github.com/alice");
    }

    #[test]
    fn test_menu_entry_requires_url() {
        let result = SiteConfig::from_str(
            r#"
            [[menu.main]]
            name = "Broken"
        "#,
        );
        assert!(result.is_err());
    }
}
