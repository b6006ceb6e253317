//! Compile helpers for static regexes and CSS selectors.

use regex::Regex;
use scraper::Selector;

/// Compiles a regex literal known at build time.
///
/// # Panics
///
/// Panics if `pattern` is not a valid regex; patterns passed here are literals.
#[must_use]
pub fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Compiles a CSS selector literal known at build time.
///
/// # Panics
///
/// Panics if `selector` is not a valid CSS selector; selectors passed here are literals.
#[must_use]
pub fn compile_static_selector(selector: &str) -> Selector {
    Selector::parse(selector)
        .unwrap_or_else(|e| panic!("invalid static selector '{selector}': {e:?}"))
}
