use std::io::{self, Read, Seek};
use tracing::{debug, trace};
use zip::ZipArchive;

use super::{Archive, ArchiveEntry};
use crate::errors::SearchResult;

/// An entry whose content is held in memory
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    name: String,
    data: Vec<u8>,
}

impl MemoryEntry {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl ArchiveEntry for MemoryEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(self.data.as_slice()))
    }
}

/// A fully decompressed archive snapshot
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    entries: Vec<MemoryEntry>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.entries.push(MemoryEntry::new(name, data));
    }

    /// Builder-style [`push`](Self::push)
    pub fn with_entry(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.push(name, data);
        self
    }

    /// Loads a ZIP archive, keeping regular files of at most `max_file_size` bytes.
    ///
    /// Entries are decompressed up front in archive order, so scanning never touches the
    /// ZIP reader and entries can be opened from any thread.
    pub fn from_zip<R: Read + Seek>(reader: R, max_file_size: u64) -> SearchResult<Self> {
        let mut zip = ZipArchive::new(reader)?;
        let mut entries = Vec::with_capacity(zip.len());
        let mut skipped = 0usize;

        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            if file.size() > max_file_size {
                trace!(name = file.name(), size = file.size(), "skipping oversized entry");
                skipped += 1;
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(MemoryEntry::new(file.name(), data));
        }

        debug!(entries = entries.len(), skipped, "loaded zip archive");
        Ok(Self { entries })
    }
}

impl FromIterator<MemoryEntry> for MemoryArchive {
    fn from_iter<I: IntoIterator<Item = MemoryEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Archive for MemoryArchive {
    type Entry = MemoryEntry;

    fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.add_directory("dir/", options).unwrap();
        for (name, data) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_entries_open_independently() {
        let archive = MemoryArchive::new()
            .with_entry("a.txt", "alpha")
            .with_entry("b.txt", "beta");
        assert_eq!(archive.len(), 2);

        let mut buf = String::new();
        archive.entries()[1]
            .open()
            .unwrap()
            .read_to_string(&mut buf)
            .unwrap();
        assert_eq!(buf, "beta");
        assert_eq!(archive.entries()[0].name(), "a.txt");
    }

    #[test]
    fn test_from_zip_skips_dirs_and_large_files() {
        let big = vec![b'x'; 64];
        let bytes = build_zip(&[
            ("dir/a.txt", b"hello"),
            ("big.bin", &big),
            ("c.txt", b"world"),
        ]);

        let archive = MemoryArchive::from_zip(Cursor::new(bytes), 32).unwrap();
        let names: Vec<_> = archive.entries().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["dir/a.txt", "c.txt"]);
        assert_eq!(archive.entries()[0].data(), b"hello");
    }

    #[test]
    fn test_from_zip_rejects_garbage() {
        let result = MemoryArchive::from_zip(Cursor::new(b"not a zip".to_vec()), 1024);
        assert!(matches!(
            result,
            Err(crate::errors::SearchError::Archive(_))
        ));
    }
}
