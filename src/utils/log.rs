//! Logging utilities with colored output.
//!
//! `log!` prints one line per event with a colored module prefix, truncated
//! to the terminal width.
//!
//! # Example
//!
//! ```ignore
//! log!("content"; "loaded {} pages", count);
//! log!("warn"; "{}: `{}` is undefined", path.display(), name);
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::OnceLock,
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;

/// Total prefix length for a module name: `[` + module + `]` + space.
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::utils::log::log($module, &format!($($arg)*))
    }};
}

/// Log a message with a colored module prefix.
///
/// Automatically truncates long messages to fit terminal width.
#[inline]
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module, &module.to_ascii_lowercase());
    let width = get_terminal_width() as usize;

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();

    let max_msg_len = width.saturating_sub(calc_prefix_len(module.len()));
    let message = truncate_str(message, max_msg_len);

    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "error" => prefix.bright_red().bold(),
        "warn" => prefix.bright_magenta().bold(),
        "build" => prefix.bright_green().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within max_len bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_prefix_len() {
        // "content" -> "[content] " = 7 + 2 + 1
        assert_eq!(calc_prefix_len(7), 10);
        assert_eq!(calc_prefix_len(0), 3);
    }

    #[test]
    fn test_truncate_str_fits() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_str_cuts() {
        assert_eq!(truncate_str("hello world", 5), "hello");
        assert_eq!(truncate_str("hello", 0), "");
    }

    #[test]
    fn test_truncate_str_unicode_boundary() {
        // "你" is 3 bytes, cutting at 4 must fall back to 3
        assert_eq!(truncate_str("你好", 4), "你");
        assert_eq!(truncate_str("a你b", 3), "a");
    }

    #[test]
    fn test_colorize_prefix_keeps_module_name() {
        colored::control::set_override(false);
        assert_eq!(colorize_prefix("warn", "warn").to_string(), "[warn]");
        assert_eq!(colorize_prefix("Build", "build").to_string(), "[Build]");
    }
}
