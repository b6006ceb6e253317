//! Noun tagging seam.
//!
//! Counting and corpus building only see [`NounTagger`]. A real
//! part-of-speech tagger is an external collaborator; [`StopWordTagger`] is
//! the built-in stand-in that keeps every non-stop-word token.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use stop_words::{LANGUAGE, get};
use tracing::instrument;

/// Returns the ordered noun tokens of a text.
pub trait NounTagger {
    fn nouns(&self, text: &str) -> Vec<String>;
}

impl<F> NounTagger for F
where
    F: Fn(&str) -> Vec<String>,
{
    fn nouns(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

/// Splits on non-alphanumeric characters and drops stop words.
///
/// Matching is case-insensitive; tokens keep their original case.
#[derive(Debug, Clone)]
pub struct StopWordTagger {
    stop_words: HashSet<String>,
}

impl StopWordTagger {
    /// Creates a tagger with the English stop-word list.
    #[must_use]
    #[instrument]
    pub fn new() -> Self {
        let stop_words = get(LANGUAGE::English)
            .into_iter()
            .map(|word| word.to_lowercase())
            .collect();
        Self { stop_words }
    }

    /// Adds extra stop words, e.g. domain terms too common to be informative.
    #[must_use]
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_words
            .extend(words.into_iter().map(|word| word.as_ref().to_lowercase()));
        self
    }
}

impl Default for StopWordTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl NounTagger for StopWordTagger {
    fn nouns(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .filter(|token| !self.stop_words.contains(&token.to_lowercase()))
            .map(String::from)
            .collect()
    }
}

/// Tags `text` and discards single-character tokens.
#[must_use]
pub fn extract_nouns(tagger: &dyn NounTagger, text: &str) -> Vec<String> {
    tagger
        .nouns(text)
        .into_iter()
        .filter(|noun| noun.chars().count() > 1)
        .collect()
}

/// Loads a stop-word list from a file (one word per line).
///
/// Blank lines and lines starting with `#` are skipped.
///
/// # Errors
/// Returns error if the file cannot be read.
#[instrument]
pub fn load_stop_words(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read stop-word file '{}'", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}
