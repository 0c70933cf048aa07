//! Find and replace engine behind the Search menu.
//!
//! The engine covers the two workflows the editor shell exposes: find the
//! first match after a starting offset (Find), and replace every match in a
//! buffer (Replace). Patterns are either literal text or regular expressions,
//! with optional case sensitivity and whole-word matching.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Error conditions raised by the search engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("search pattern cannot be empty")]
    EmptyPattern,
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Determines how the search pattern is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchMode {
    Plain,
    Regex,
}

/// Options supplied to the search engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOptions {
    pub pattern: String,
    pub mode: SearchMode,
    pub case_sensitive: bool,
    pub whole_word: bool,
}

impl SearchOptions {
    /// Creates an option set for a literal pattern with the menu defaults.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            mode: SearchMode::Plain,
            case_sensitive: true,
            whole_word: false,
        }
    }

    pub fn regex(mut self) -> Self {
        self.mode = SearchMode::Regex;
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    pub fn whole_word(mut self) -> Self {
        self.whole_word = true;
        self
    }

    fn validate(&self) -> Result<(), SearchError> {
        if self.pattern.is_empty() {
            return Err(SearchError::EmptyPattern);
        }
        Ok(())
    }
}

/// A single match produced by a search query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchMatch {
    pub start: usize,
    pub end: usize,
    pub matched: String,
}

/// Outcome of a `replace_all` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplaceAllOutcome {
    pub replaced_text: String,
    pub replacements: usize,
}

/// Finds the first match at or after `start_pos`.
pub fn find_first(
    text: &str,
    start_pos: usize,
    options: &SearchOptions,
) -> Result<Option<SearchMatch>, SearchError> {
    options.validate()?;
    let regex = build_regex(options)?;
    let start = start_pos.min(text.len());
    Ok(regex.find_at(text, start).map(|found| SearchMatch {
        start: found.start(),
        end: found.end(),
        matched: found.as_str().to_string(),
    }))
}

/// Replaces every match in `text`, returning the new buffer and the count.
///
/// In plain mode the replacement is inserted literally; in regex mode it may
/// reference capture groups using the `regex` crate syntax.
pub fn replace_all(
    text: &str,
    options: &SearchOptions,
    replacement: &str,
) -> Result<ReplaceAllOutcome, SearchError> {
    options.validate()?;
    let regex = build_regex(options)?;
    let replacements = regex.find_iter(text).count();
    if replacements == 0 {
        return Ok(ReplaceAllOutcome {
            replaced_text: text.to_string(),
            replacements: 0,
        });
    }
    let replaced_text = match options.mode {
        SearchMode::Plain => regex
            .replace_all(text, regex::NoExpand(replacement))
            .into_owned(),
        SearchMode::Regex => regex.replace_all(text, replacement).into_owned(),
    };
    Ok(ReplaceAllOutcome {
        replaced_text,
        replacements,
    })
}

fn build_regex(options: &SearchOptions) -> Result<Regex, SearchError> {
    let mut pattern = match options.mode {
        SearchMode::Plain => regex::escape(&options.pattern),
        SearchMode::Regex => options.pattern.clone(),
    };
    if options.whole_word {
        pattern = format!(r"\b(?:{pattern})\b");
    }
    RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .build()
        .map_err(|err| SearchError::InvalidPattern(err.to_string()))
}
