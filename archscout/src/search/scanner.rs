use memchr::memchr;
use std::io::{self, Read};
use std::ops::Range;
use tracing::trace;

use super::fold::fold_into;
use super::matcher::CompiledMatcher;
use crate::archive::ArchiveEntry;
use crate::errors::{SearchError, SearchResult};
use crate::results::{FileMatch, LineMatch};

/// Capacity of the line buffer. Lines that do not fit are not searched.
pub const READ_BUFFER_CAPACITY: usize = 4096;

/// Maximum number of matching lines reported per file
pub const MAX_LINE_MATCHES: usize = 100;

/// Maximum number of (offset, length) pairs reported per line
pub const MAX_OFFSETS: usize = 10;

enum NextLine {
    Line(Range<usize>),
    TooLong,
    Eof,
}

/// Fixed-capacity line splitter that keeps its buffer between streams
struct LineReader {
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
    eof: bool,
}

impl LineReader {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity].into_boxed_slice(),
            pos: 0,
            filled: 0,
            eof: false,
        }
    }

    fn reset(&mut self) {
        self.pos = 0;
        self.filled = 0;
        self.eof = false;
    }

    /// Returns the range of the next line in `self.buf`, without its terminator
    fn next_line<R: Read + ?Sized>(&mut self, src: &mut R) -> io::Result<NextLine> {
        loop {
            if let Some(i) = memchr(b'\n', &self.buf[self.pos..self.filled]) {
                let start = self.pos;
                let newline = start + i;
                let end = if newline > start && self.buf[newline - 1] == b'\r' {
                    newline - 1
                } else {
                    newline
                };
                self.pos = newline + 1;
                return Ok(NextLine::Line(start..end));
            }

            if self.eof {
                if self.pos < self.filled {
                    let line = self.pos..self.filled;
                    self.pos = self.filled;
                    return Ok(NextLine::Line(line));
                }
                return Ok(NextLine::Eof);
            }

            if self.pos == 0 && self.filled == self.buf.len() {
                return Ok(NextLine::TooLong);
            }

            if self.pos > 0 {
                self.buf.copy_within(self.pos..self.filled, 0);
                self.filled -= self.pos;
                self.pos = 0;
            }

            match src.read(&mut self.buf[self.filled..]) {
                Ok(0) => self.eof = true,
                Ok(n) => self.filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

/// Scans byte streams line by line for one [`CompiledMatcher`].
///
/// A scanner owns its read buffer and fold buffer and reuses them for every stream it scans,
/// so it takes `&mut self` and is meant to be owned by a single worker. Each concurrent worker
/// gets its own scanner from [`CompiledMatcher::scanner`] or [`Clone`]; clones share the
/// compiled program but never the buffers.
pub struct Scanner {
    matcher: CompiledMatcher,
    reader: LineReader,
    fold_buf: Vec<u8>,
}

impl Clone for Scanner {
    fn clone(&self) -> Self {
        Scanner::new(self.matcher.clone())
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

impl Scanner {
    pub(crate) fn new(matcher: CompiledMatcher) -> Self {
        let fold_buf = if matcher.ignore_case() {
            Vec::with_capacity(READ_BUFFER_CAPACITY)
        } else {
            Vec::new()
        };
        Self {
            matcher,
            reader: LineReader::with_capacity(READ_BUFFER_CAPACITY),
            fold_buf,
        }
    }

    /// Returns a [`LineMatch`] for each matching line of `src`, at most [`MAX_LINE_MATCHES`].
    ///
    /// Scanning stops early, without error, at the first line longer than the read buffer;
    /// such files are usually minified or generated and the matches found so far are kept.
    pub fn find<R: Read + ?Sized>(&mut self, src: &mut R) -> io::Result<Vec<LineMatch>> {
        self.reader.reset();
        let regex = self.matcher.regex();
        let ignore_case = self.matcher.ignore_case();

        let mut matches = Vec::new();
        let mut line_number = 0;
        while matches.len() < MAX_LINE_MATCHES {
            let range = match self.reader.next_line(src)? {
                NextLine::Line(range) => range,
                NextLine::TooLong => {
                    trace!(line_number, "line exceeds read buffer, skipping rest of file");
                    break;
                }
                NextLine::Eof => break,
            };
            let line = &self.reader.buf[range];

            let haystack: &[u8] = if ignore_case {
                fold_into(&mut self.fold_buf, line);
                &self.fold_buf
            } else {
                line
            };

            // Most lines do not match; only pay for the offset vector when one does.
            if regex.is_match(haystack) {
                let offset_and_lengths = regex
                    .find_iter(haystack)
                    .take(MAX_OFFSETS)
                    .map(|m| (m.start(), m.len()))
                    .collect();
                matches.push(LineMatch {
                    preview: String::from_utf8_lossy(line).into_owned(),
                    line_number,
                    offset_and_lengths,
                });
            }
            line_number += 1;
        }
        Ok(matches)
    }

    /// Opens `entry` and scans it
    pub fn find_entry<E: ArchiveEntry + ?Sized>(&mut self, entry: &E) -> SearchResult<FileMatch> {
        let path = entry.name();
        let mut src = entry
            .open()
            .map_err(|e| SearchError::stream_read(path, e))?;
        let line_matches = self
            .find(&mut src)
            .map_err(|e| SearchError::stream_read(path, e))?;
        Ok(FileMatch {
            path: path.to_string(),
            line_matches,
        })
    }
}
