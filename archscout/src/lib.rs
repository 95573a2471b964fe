pub mod archive;
pub mod cancel;
pub mod config;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod results;
pub mod search;

pub use crate::archive::{Archive, ArchiveEntry, DirArchive, MemoryArchive};
pub use crate::cancel::CancellationToken;
pub use crate::config::SearchConfig;
pub use crate::errors::{SearchError, SearchResult};
pub use crate::metrics::{MetricsRecorder, SearchMetrics};
pub use crate::results::{FileMatch, LineMatch, SearchOutcome, SearchResult as SearchOutput};
pub use crate::search::{search, Dispatcher, SearchParameters};
