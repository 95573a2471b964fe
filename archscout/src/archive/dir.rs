use ignore::WalkBuilder;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::{Archive, ArchiveEntry};
use crate::config::SearchConfig;
use crate::errors::{SearchError, SearchResult};
use crate::filters::should_include_file;

/// A file on disk, named by its path relative to the snapshot root
#[derive(Debug, Clone)]
pub struct FileEntry {
    name: String,
    path: PathBuf,
}

impl FileEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArchiveEntry for FileEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(&self.path)?))
    }
}

/// A directory tree treated as an archive snapshot.
///
/// The walk honours `.gitignore` files and skips hidden entries, likely-binary files and files
/// above the configured size ceiling. Entries are ordered by path.
#[derive(Debug, Clone)]
pub struct DirArchive {
    root: PathBuf,
    entries: Vec<FileEntry>,
}

impl DirArchive {
    pub fn open(root: impl AsRef<Path>, config: &SearchConfig) -> SearchResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(SearchError::archive(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let mut walker = WalkBuilder::new(&root);
        walker
            .hidden(true)
            .ignore(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .sort_by_file_path(|a, b| a.cmp(b))
            .max_filesize(Some(config.max_file_size));

        let mut entries = Vec::new();
        for result in walker.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    trace!(error = %e, "skipping unreadable path");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let rel = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            if !should_include_file(rel, &config.file_extensions, &config.ignore_patterns) {
                continue;
            }
            entries.push(FileEntry {
                name: rel.to_string_lossy().replace('\\', "/"),
                path: entry.into_path(),
            });
        }

        debug!(root = %root.display(), entries = entries.len(), "collected directory snapshot");
        Ok(Self { root, entries })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Archive for DirArchive {
    type Entry = FileEntry;

    fn entries(&self) -> &[FileEntry] {
        &self.entries
    }
}
