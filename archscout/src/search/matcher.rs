use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fold::fold_pattern;
use super::scanner::Scanner;
use crate::errors::{SearchError, SearchResult};

/// What to search for, as handed over by the request layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParameters {
    /// Pattern text, literal unless `is_regexp` is set
    pub pattern: String,
    #[serde(default)]
    pub is_regexp: bool,
    #[serde(default)]
    pub is_case_sensitive: bool,
    #[serde(default)]
    pub is_word_match: bool,
}

impl SearchParameters {
    /// Literal, case-insensitive search for `pattern`
    pub fn literal(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    /// Regular expression search for `pattern`
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            is_regexp: true,
            ..Default::default()
        }
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.is_case_sensitive = yes;
        self
    }

    pub fn word_match(mut self, yes: bool) -> Self {
        self.is_word_match = yes;
        self
    }
}

/// A compiled query, built once per search call.
///
/// Cloning only shares the immutable compiled program. Scanning state lives in [`Scanner`],
/// which every concurrent worker has to obtain for itself through [`CompiledMatcher::scanner`].
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    regex: Regex,
    ignore_case: bool,
}

impl CompiledMatcher {
    /// The expression actually handed to the regex engine
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether input bytes must be folded before matching
    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Creates a scanner with its own read and fold buffers
    pub fn scanner(&self) -> Scanner {
        Scanner::new(self.clone())
    }
}

/// Compiles search parameters into a matcher.
///
/// Case-insensitive queries lowercase the expression here and fold the input bytes at scan time;
/// the engine's own `(?i)` mode is noticeably slower for this workload.
pub fn compile(params: &SearchParameters) -> SearchResult<CompiledMatcher> {
    let mut expr = if params.is_regexp {
        params.pattern.clone()
    } else {
        regex::escape(&params.pattern)
    };
    if params.is_word_match {
        expr = format!(r"\b(?:{})\b", expr);
    }
    let ignore_case = !params.is_case_sensitive;
    if ignore_case {
        expr = fold_pattern(&expr);
    }

    let regex = Regex::new(&expr).map_err(|e| SearchError::invalid_pattern(e.to_string()))?;
    debug!(expr = %expr, ignore_case, "compiled search pattern");

    Ok(CompiledMatcher { regex, ignore_case })
}
