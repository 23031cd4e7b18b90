//! HTML minification.
//!
//! Enabled or disabled through `[build] minify` in `SiteConfig`.

use crate::config::SiteConfig;
use std::borrow::Cow;

/// Minify rendered markup when the config asks for it.
///
/// Returns `Cow::Borrowed` if minify disabled, `Cow::Owned` if minified.
pub fn minify<'a>(html: &'a str, config: &SiteConfig) -> Cow<'a, str> {
    if !config.build.minify {
        return Cow::Borrowed(html);
    }
    let bytes = minify_html_inner(html.as_bytes());
    match String::from_utf8(bytes) {
        Ok(minified) => Cow::Owned(minified),
        Err(err) => Cow::Owned(String::from_utf8_lossy(err.as_bytes()).into_owned()),
    }
}

/// Minify HTML content using `minify_html` crate.
fn minify_html_inner(html: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    minify_html::minify(html, &cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_minify(enabled: bool) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.minify = enabled;
        config
    }

    #[test]
    fn test_minify_html_basic() {
        let html = "<html>\n  <head>\n  </head>\n  <body>\n    <p>Hello</p>\n  </body>\n</html>";
        let result = minify(html, &config_with_minify(true));

        assert!(!result.contains("\n  "));
        assert!(result.contains("<p>Hello</p>"));
    }

    #[test]
    fn test_minify_html_preserves_content() {
        let result = minify("<p>Hello World</p>", &config_with_minify(true));
        assert!(result.contains("Hello World"));
    }

    #[test]
    fn test_minify_html_enabled() {
        let html = "<html>\n  <body>\n  </body>\n</html>";

        let minified = minify(html, &config_with_minify(true));
        let not_minified = minify(html, &config_with_minify(false));

        assert!(minified.len() < not_minified.len());
        assert_eq!(&*not_minified, html);
    }

    #[test]
    fn test_minify_html_disabled_borrows() {
        let html = "<html>\n  <body>\n  </body>\n</html>";
        let result = minify(html, &config_with_minify(false));

        assert!(matches!(result, Cow::Borrowed(_)));
    }
}
