//! Error types for archive searches.
//!
//! A search call can fail in two very different ways. Compiling the pattern happens before any
//! work is scheduled, so an [`SearchError::InvalidPattern`] fails the whole call. Reading one
//! archive entry is local to that entry: a [`SearchError::StreamRead`] is recorded once as the
//! call's error, entries not yet handed to a worker are discarded, and the caller receives both the partial
//! results and the error.
//!
//! ```rust,ignore
//! let output = search(&ctx, &params, &archive, &dispatcher)?; // InvalidPattern surfaces here
//! if let Some(err) = &output.error {
//!     // partial success: output.file_matches is still meaningful
//! }
//! ```
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Failed to read {path}: {source}")]
    StreamRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Archive error: {0}")]
    Archive(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SearchError {
    pub fn invalid_pattern(msg: impl Into<String>) -> Self {
        Self::InvalidPattern(msg.into())
    }

    pub fn stream_read(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::StreamRead {
            path: path.into(),
            source,
        }
    }

    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn thread_pool(msg: impl Into<String>) -> Self {
        Self::ThreadPool(msg.into())
    }
}

impl From<zip::result::ZipError> for SearchError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

impl From<config::ConfigError> for SearchError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_creation() {
        let err = SearchError::invalid_pattern("unclosed group");
        assert!(matches!(err, SearchError::InvalidPattern(_)));

        let err = SearchError::stream_read("a.txt", io::Error::other("boom"));
        assert!(matches!(err, SearchError::StreamRead { .. }));

        let err = SearchError::archive("bad central directory");
        assert!(matches!(err, SearchError::Archive(_)));

        let err = SearchError::thread_pool("no threads");
        assert!(matches!(err, SearchError::ThreadPool(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = SearchError::invalid_pattern("regex parse error");
        assert_eq!(err.to_string(), "Invalid pattern: regex parse error");

        let err = SearchError::stream_read("dir/b.txt", io::Error::other("disk on fire"));
        assert_eq!(err.to_string(), "Failed to read dir/b.txt: disk on fire");

        let err = SearchError::config_error("Missing required field");
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required field"
        );
    }
}
