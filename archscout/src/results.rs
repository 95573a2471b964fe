//! Search result types.
//!
//! The structures here are what a search hands to its caller for serialization. They are plain
//! owned data: once [`SearchResult`] is returned the engine keeps no reference to any of it.
//!
//! Size bounds are enforced while the results are produced:
//! - a [`LineMatch`] carries at most 10 (offset, length) pairs
//! - a [`FileMatch`] carries at most 100 line matches, in increasing line order
//! - a [`SearchResult`] carries at most 1000 file matches, in completion order
use serde::Serialize;

use crate::errors::SearchError;

/// One matching line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMatch {
    /// The full line, without its terminator
    pub preview: String,
    /// Zero-based line number within the file
    pub line_number: usize,
    /// Byte offset and length of each match on the line
    pub offset_and_lengths: Vec<(usize, usize)>,
}

/// All matching lines of one archive entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMatch {
    pub path: String,
    pub line_matches: Vec<LineMatch>,
}

/// How a search call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchOutcome {
    /// Every entry was scanned
    Completed,
    /// The file match limit was reached and the rest of the archive was skipped
    Capped,
    /// The caller cancelled before every entry was handed out
    Cancelled,
    /// At least one entry could not be read
    Failed,
}

/// The complete output of one search call
#[derive(Debug)]
pub struct SearchResult {
    /// Matching files, in the order workers finished them
    pub file_matches: Vec<FileMatch>,
    pub outcome: SearchOutcome,
    /// The first error recorded by any worker
    pub error: Option<SearchError>,
}

impl SearchResult {
    /// Creates an empty, completed result
    pub fn new() -> Self {
        Self {
            file_matches: Vec::new(),
            outcome: SearchOutcome::Completed,
            error: None,
        }
    }

    /// Total number of matching lines over all files
    pub fn total_line_matches(&self) -> usize {
        self.file_matches.iter().map(|fm| fm.line_matches.len()).sum()
    }

    /// True when an error was recorded but some files still matched
    pub fn is_partial(&self) -> bool {
        self.error.is_some() && !self.file_matches.is_empty()
    }
}

impl Default for SearchResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> LineMatch {
        LineMatch {
            preview: format!("line {}", n),
            line_number: n,
            offset_and_lengths: vec![(0, 4)],
        }
    }

    #[test]
    fn test_search_result_new() {
        let result = SearchResult::new();
        assert!(result.file_matches.is_empty());
        assert_eq!(result.outcome, SearchOutcome::Completed);
        assert!(result.error.is_none());
        assert_eq!(result.total_line_matches(), 0);
    }

    #[test]
    fn test_total_and_partial() {
        let mut result = SearchResult::new();
        result.file_matches.push(FileMatch {
            path: "a.txt".to_string(),
            line_matches: vec![line(0), line(3)],
        });
        result.file_matches.push(FileMatch {
            path: "b.txt".to_string(),
            line_matches: vec![line(1)],
        });
        assert_eq!(result.total_line_matches(), 3);
        assert!(!result.is_partial());

        result.error = Some(SearchError::archive("truncated"));
        assert!(result.is_partial());
    }

    #[test]
    fn test_serialized_shape() {
        let fm = FileMatch {
            path: "src/lib.rs".to_string(),
            line_matches: vec![LineMatch {
                preview: "say hello".to_string(),
                line_number: 2,
                offset_and_lengths: vec![(4, 5)],
            }],
        };
        let json = serde_json::to_value(&fm).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "path": "src/lib.rs",
                "lineMatches": [{
                    "preview": "say hello",
                    "lineNumber": 2,
                    "offsetAndLengths": [[4, 5]]
                }]
            })
        );
        assert_eq!(
            serde_json::to_value(SearchOutcome::Capped).unwrap(),
            serde_json::json!("capped")
        );
    }
}
