//! Searching archive snapshots.
//!
//! A query moves through four pieces:
//!
//! 1. [`matcher::compile`] turns [`SearchParameters`] into a [`CompiledMatcher`]. Literal
//!    patterns are escaped, whole-word queries get `\b` anchors, and case-insensitive queries
//!    are lowercased so that matching can run on folded input instead of the engine's slower
//!    case-insensitive mode.
//! 2. [`fold`] holds the ASCII folding table used on every line of a case-insensitive scan.
//! 3. [`Scanner`] reads one stream line by line through a fixed buffer, checks each line for a
//!    match without allocating, and only then collects match offsets. Long lines end the scan
//!    of that stream.
//! 4. [`Dispatcher`] runs a fixed set of workers, each with its own scanner, and collects their
//!    file matches on the calling thread until the archive is exhausted, the caller cancels, or
//!    the file match limit is reached.
//!
//! ```rust,ignore
//! let ctx = CancellationToken::new();
//! let params = SearchParameters::literal("TODO");
//! let output = search(&ctx, &params, &archive, &Dispatcher::default())?;
//! for fm in &output.file_matches {
//!     println!("{}: {} lines", fm.path, fm.line_matches.len());
//! }
//! ```
pub mod dispatcher;
pub mod engine;
pub mod fold;
pub mod matcher;
pub mod scanner;

pub use dispatcher::{Dispatcher, MAX_FILE_MATCHES};
pub use engine::search;
pub use matcher::{compile, CompiledMatcher, SearchParameters};
pub use scanner::{Scanner, MAX_LINE_MATCHES, MAX_OFFSETS, READ_BUFFER_CAPACITY};
