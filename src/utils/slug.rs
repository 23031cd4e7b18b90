//! URL slugification and path utilities.
//!
//! Converts file names, titles and taxonomy terms to URL-safe formats, and
//! maps URL paths to output files.

use crate::config::SlugMode;
use std::path::PathBuf;

/// Characters forbidden in file paths and fragments
const FORBIDDEN_CHARS: &[char] = &[
    '<', '>', ':', '|', '?', '*', '#', '\\', '(', ')', '[', ']', '\t', '\r', '\n', '"', '\'',
];

// ============================================================================
// Slugification
// ============================================================================

/// Convert a single path segment (file stem, explicit slug, term) to URL-safe format.
pub fn slugify(text: &str, mode: SlugMode) -> String {
    match mode {
        SlugMode::Safe => sanitize_text(text),
        SlugMode::On => slug::slugify(text),
        SlugMode::No => text.trim().to_owned(),
    }
}

/// Slugify every `/`-separated segment of a URL path, dropping empty segments.
///
/// `"/My Posts//Hello World"` → `["My_Posts", "Hello_World"]` in `Safe` mode.
pub fn slugify_segments(path: &str, mode: SlugMode) -> Vec<String> {
    path.split(['/', '\\'])
        .filter(|segment| !segment.trim().is_empty())
        .map(|segment| slugify(segment, mode))
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Remove forbidden characters and replace whitespace with underscores
fn sanitize_text(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

// ============================================================================
// URL / Output Path Utilities
// ============================================================================

/// Join segments into a pretty URL path: `["posts", "hello"]` → `"/posts/hello/"`.
pub fn url_path<S: AsRef<str>>(segments: &[S]) -> String {
    let mut url = String::from("/");
    for segment in segments {
        url.push_str(segment.as_ref());
        url.push('/');
    }
    url
}

/// Output file of a pretty URL, relative to the output root.
///
/// | URL | Output |
/// |-----|--------|
/// | `/` | `index.html` |
/// | `/posts/hello/` | `posts/hello/index.html` |
pub fn output_file(url: &str) -> PathBuf {
    url.split('/')
        .filter(|segment| !segment.is_empty())
        .chain(std::iter::once("index.html"))
        .collect()
}
