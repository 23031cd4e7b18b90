//! Front matter splitting and parsing.
//!
//! A content file may start with a metadata header fenced by `---` (YAML) or
//! `+++` (TOML). Both are parsed into the same JSON model, then taxonomy
//! terms are pulled out and the rest is deserialized into [`FrontMatter`].
//!
//! ```text
//! ---
//! title: Testing in CI
//! date: 2023-03-01
//! tags: [Testing]
//! cover:
//!   image: /img/ci.png
//! ---
//! Body in *Markdown*.
//! ```

use crate::utils::value::toml_to_json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Front matter syntax, chosen by the opening fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Toml,
}

impl Format {
    const fn fence(self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }

    fn from_fence(line: &str) -> Option<Self> {
        match line.trim_end() {
            "---" => Some(Self::Yaml),
            "+++" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// A file split into its raw header and Markdown body.
#[derive(Debug, PartialEq, Eq)]
pub struct Split<'a> {
    pub header: Option<(Format, &'a str)>,
    pub body: &'a str,
}

/// Declared metadata of a content item.
///
/// Unknown keys are kept in `params` and exposed to templates as `page.params`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, alias = "updated")]
    pub lastmod: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub layout: Option<String>,
    /// Content type; falls back to the section when choosing a template.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub cover: Option<Cover>,
    /// Overrides the slug derived from the file name.
    #[serde(default)]
    pub slug: Option<String>,
    /// Overrides the whole URL path.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub params: BTreeMap<String, Value>,
}

/// Cover image. Accepts either a plain path or a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CoverRepr")]
pub struct Cover {
    pub image: String,
    pub alt: String,
    pub caption: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CoverRepr {
    Image(String),
    Full {
        image: String,
        #[serde(default)]
        alt: String,
        #[serde(default)]
        caption: String,
    },
}

impl From<CoverRepr> for Cover {
    fn from(repr: CoverRepr) -> Self {
        match repr {
            CoverRepr::Image(image) => Self {
                image,
                ..Self::default()
            },
            CoverRepr::Full {
                image,
                alt,
                caption,
            } => Self {
                image,
                alt,
                caption,
            },
        }
    }
}

/// Parsed header: declared fields plus taxonomy terms keyed by plural name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub front: FrontMatter,
    pub taxonomies: BTreeMap<String, BTreeSet<String>>,
}

// ============================================================================
// Splitting
// ============================================================================

/// Split a file into header and body.
///
/// The header must start on the first line. A missing closing fence is an error.
pub fn split(source: &str) -> Result<Split<'_>, String> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let Some((first, rest)) = source.split_once('\n') else {
        if Format::from_fence(source).is_some() {
            return Err("unterminated front matter".into());
        }
        return Ok(Split {
            header: None,
            body: source,
        });
    };
    let Some(format) = Format::from_fence(first) else {
        return Ok(Split {
            header: None,
            body: source,
        });
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == format.fence() {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok(Split {
                header: Some((format, header)),
                body,
            });
        }
        offset += line.len();
    }

    Err("unterminated front matter".into())
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a raw header into [`Metadata`].
///
/// `taxonomies` lists the plural names whose values are taxonomy terms.
pub fn parse<'a>(
    header: Option<(Format, &str)>,
    taxonomies: impl IntoIterator<Item = &'a str>,
) -> Result<Metadata, String> {
    let mut map = match header {
        None => Map::new(),
        Some((format, text)) => to_object(format, text)?,
    };

    let mut terms = BTreeMap::new();
    for plural in taxonomies {
        let value = map.remove(plural).unwrap_or(Value::Null);
        terms.insert(plural.to_owned(), parse_terms(plural, value)?);
    }

    let front: FrontMatter = serde_json::from_value(Value::Object(map)).map_err(|e| e.to_string())?;

    Ok(Metadata {
        front,
        taxonomies: terms,
    })
}

/// Parse YAML or TOML text into a JSON object.
fn to_object(format: Format, text: &str) -> Result<Map<String, Value>, String> {
    let value = match format {
        Format::Yaml => {
            if text.trim().is_empty() {
                Value::Null
            } else {
                serde_yaml::from_str::<Value>(text).map_err(|e| format!("invalid YAML: {e}"))?
            }
        }
        Format::Toml => {
            let table: toml::Value =
                toml::from_str(text).map_err(|e| format!("invalid TOML: {e}"))?;
            toml_to_json(&table)
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err("front matter must be a mapping".into()),
    }
}

/// Accept a single term or a list of terms. Blank terms are dropped.
fn parse_terms(plural: &str, value: Value) -> Result<BTreeSet<String>, String> {
    let invalid = || format!("`{plural}` must be a string or a list of strings");
    let raw = match value {
        Value::Null => vec![],
        Value::String(term) => vec![term],
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(term) => Ok(term),
                _ => Err(invalid()),
            })
            .collect::<Result<_, _>>()?,
        _ => return Err(invalid()),
    };

    Ok(raw
        .into_iter()
        .map(|term| term.trim().to_owned())
        .filter(|term| !term.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAXONOMIES: [&str; 2] = ["categories", "tags"];

    fn parse_str(source: &str) -> Result<(Metadata, &str), String> {
        let split = split(source)?;
        Ok((parse(split.header, TAXONOMIES)?, split.body))
    }

    #[test]
    fn test_split_yaml() {
        let split = split("---\ntitle: A\n---\nbody\n").unwrap();
        assert_eq!(split.header, Some((Format::Yaml, "title: A\n")));
        assert_eq!(split.body, "body\n");
    }

    #[test]
    fn test_split_toml_with_crlf() {
        let split = split("+++\r\ntitle = \"A\"\r\n+++\r\nbody").unwrap();
        assert_eq!(split.header, Some((Format::Toml, "title = \"A\"\r\n")));
        assert_eq!(split.body, "body");
    }

    #[test]
    fn test_split_without_header() {
        let split = split("# Just markdown\n\n---\n").unwrap();
        assert_eq!(split.header, None);
        assert_eq!(split.body, "# Just markdown\n\n---\n");
    }

    #[test]
    fn test_split_unterminated() {
        assert!(split("---\ntitle: A\nbody").is_err());
        assert!(split("---").is_err());
    }

    #[test]
    fn test_split_empty_header() {
        let split = split("---\n---\nbody").unwrap();
        assert_eq!(split.header, Some((Format::Yaml, "")));
        assert_eq!(split.body, "body");
    }

    #[test]
    fn test_parse_yaml_fields() {
        let (meta, body) = parse_str(
            "---\ntitle: Testing in CI\ndate: 2023-03-01\ntags: [Testing]\nlayout: post\ntype: note\nshow_toc: true\n---\nHello",
        )
        .unwrap();

        assert_eq!(body, "Hello");
        assert_eq!(meta.front.title, "Testing in CI");
        assert_eq!(meta.front.date.as_deref(), Some("2023-03-01"));
        assert_eq!(meta.front.layout.as_deref(), Some("post"));
        assert_eq!(meta.front.kind.as_deref(), Some("note"));
        assert_eq!(meta.front.params["show_toc"], Value::Bool(true));
        assert!(!meta.front.params.contains_key("tags"));
        assert_eq!(
            meta.taxonomies["tags"],
            BTreeSet::from(["Testing".to_string()])
        );
        assert!(meta.taxonomies["categories"].is_empty());
    }

    #[test]
    fn test_parse_toml_fields() {
        let (meta, _) = parse_str(
            "+++\ntitle = \"Ops\"\ndate = 2023-07-05\ndraft = true\ntags = \"DevOps\"\n+++\n",
        )
        .unwrap();

        assert_eq!(meta.front.title, "Ops");
        assert_eq!(meta.front.date.as_deref(), Some("2023-07-05"));
        assert!(meta.front.draft);
        assert_eq!(meta.taxonomies["tags"], BTreeSet::from(["DevOps".to_string()]));
    }

    #[test]
    fn test_parse_cover_forms() {
        let (meta, _) = parse_str("---\ncover: /img/a.png\n---\n").unwrap();
        assert_eq!(meta.front.cover.unwrap().image, "/img/a.png");

        let (meta, _) =
            parse_str("---\ncover:\n  image: /img/b.png\n  alt: A boat\n---\n").unwrap();
        let cover = meta.front.cover.unwrap();
        assert_eq!(cover.image, "/img/b.png");
        assert_eq!(cover.alt, "A boat");
        assert_eq!(cover.caption, "");
    }

    #[test]
    fn test_parse_updated_alias() {
        let (meta, _) = parse_str("---\nupdated: 2024-01-01\n---\n").unwrap();
        assert_eq!(meta.front.lastmod.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_terms_are_trimmed_and_deduplicated() {
        let (meta, _) = parse_str("---\ntags: [\" Rust \", Rust, \"\"]\n---\n").unwrap();
        assert_eq!(meta.taxonomies["tags"], BTreeSet::from(["Rust".to_string()]));
    }

    #[test]
    fn test_invalid_yaml_syntax() {
        let err = parse_str("---\ntitle: [unclosed\n---\n").unwrap_err();
        assert!(err.contains("invalid YAML"));
    }

    #[test]
    fn test_invalid_toml_syntax() {
        let err = parse_str("+++\ntitle = \n+++\n").unwrap_err();
        assert!(err.contains("invalid TOML"));
    }

    #[test]
    fn test_non_mapping_header() {
        let err = parse_str("---\n- a\n- b\n---\n").unwrap_err();
        assert!(err.contains("mapping"));
    }

    #[test]
    fn test_wrong_field_type() {
        assert!(parse_str("---\ndraft: maybe\n---\n").is_err());
        assert!(parse_str("---\ntitle: [a, b]\n---\n").is_err());
    }

    #[test]
    fn test_invalid_terms() {
        let err = parse_str("---\ntags: {a: 1}\n---\n").unwrap_err();
        assert!(err.contains("`tags`"));
        assert!(parse_str("---\ntags: [1, 2]\n---\n").is_err());
    }
}
