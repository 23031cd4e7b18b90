//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }

    pub fn author() -> String {
        "<YOUR_NAME>".into()
    }

    pub fn language() -> String {
        "en-us".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn templates() -> PathBuf {
        "templates".into()
    }

    pub fn static_dir() -> PathBuf {
        "static".into()
    }

    pub fn archive() -> PathBuf {
        "archives".into()
    }

    pub fn paginate() -> usize {
        10
    }

    pub fn summary_length() -> usize {
        70
    }

    pub fn date_format() -> String {
        "%Y-%m-%d".into()
    }

    pub mod slug {
        use super::super::super::SlugMode;

        pub fn path() -> SlugMode {
            SlugMode::Safe
        }

        pub fn term() -> SlugMode {
            SlugMode::On
        }
    }
}

// ============================================================================
// [taxonomies] Section Defaults
// ============================================================================

pub mod taxonomies {
    use std::collections::BTreeMap;

    /// `tag = "tags"`, `category = "categories"`
    pub fn all() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("category".into(), "categories".into()),
            ("tag".into(), "tags".into()),
        ])
    }
}
