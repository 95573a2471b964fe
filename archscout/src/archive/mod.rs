//! Archive snapshots handed to the search engine.
//!
//! The engine only needs an ordered list of named entries that can each be opened as a byte
//! stream. Whatever produces the archive is responsible for pruning it first: entries above the
//! size ceiling never reach the scanner.
pub mod dir;
pub mod memory;

pub use dir::{DirArchive, FileEntry};
pub use memory::{MemoryArchive, MemoryEntry};

use std::io::{self, Read};

/// Default size ceiling for archive entries (512 KiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1 << 19;

/// A named entry of an archive
pub trait ArchiveEntry: Send + Sync {
    /// Path of the entry inside the archive
    fn name(&self) -> &str;

    /// Opens the entry's content for reading
    fn open(&self) -> io::Result<Box<dyn Read + '_>>;
}

/// An ordered collection of entries
pub trait Archive {
    type Entry: ArchiveEntry;

    fn entries(&self) -> &[Self::Entry];

    fn len(&self) -> usize {
        self.entries().len()
    }

    fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
