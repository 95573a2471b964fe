use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::sync::WaitGroup;
use once_cell::sync::OnceCell;
use rayon::ThreadPoolBuilder;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, field, info, info_span, trace, warn};

use super::matcher::CompiledMatcher;
use super::scanner::Scanner;
use crate::archive::ArchiveEntry;
use crate::cancel::CancellationToken;
use crate::config::{SearchConfig, DEFAULT_WORKERS};
use crate::errors::SearchError;
use crate::metrics::{MetricsRecorder, NoopRecorder, SearchSummary};
use crate::results::{FileMatch, SearchOutcome, SearchResult as SearchOutput};

/// Maximum number of matching files returned by one search call
pub const MAX_FILE_MATCHES: usize = 1000;

/// Runs one compiled query over every entry of an archive.
///
/// Each call to [`dispatch`](Self::dispatch) gets its own thread pool with one thread per
/// worker plus a feeder and a completion waiter, so concurrent calls never wait on each other's
/// workers. The calling thread aggregates results.
///
/// Cancellation, from the caller's token or from reaching [`MAX_FILE_MATCHES`], only stops new
/// entries from being handed out. A worker always finishes the entry it is scanning.
#[derive(Clone)]
pub struct Dispatcher {
    workers: NonZeroUsize,
    recorder: Arc<dyn MetricsRecorder>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_WORKERS).unwrap_or(NonZeroUsize::MIN))
    }
}

impl Dispatcher {
    pub fn new(workers: NonZeroUsize) -> Self {
        Self {
            workers,
            recorder: Arc::new(NoopRecorder),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.workers)
    }

    /// Reports call start and end to `recorder`
    pub fn with_recorder(mut self, recorder: Arc<dyn MetricsRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    /// Searches `entries` with `matcher`.
    ///
    /// Always returns the file matches collected so far. `error` holds the first failure any
    /// worker hit. Entries already being scanned by other workers still report their matches,
    /// but entries not yet handed out when the error is recorded are discarded.
    pub fn dispatch<E: ArchiveEntry>(
        &self,
        ctx: &CancellationToken,
        entries: &[E],
        matcher: &CompiledMatcher,
    ) -> SearchOutput {
        let span = info_span!(
            "concurrent_find",
            component = "matcher",
            files = entries.len(),
            error = field::Empty,
            err = field::Empty,
        );
        let _enter = span.enter();

        let start = Instant::now();
        self.recorder.search_started(entries.len());

        let output = self.run(ctx, entries, matcher);

        if let Some(err) = &output.error {
            span.record("error", true);
            span.record("err", field::display(err));
        }

        let summary = SearchSummary {
            outcome: output.outcome,
            file_matches: output.file_matches.len(),
            line_matches: output.total_line_matches(),
            elapsed: start.elapsed(),
        };
        self.recorder.search_finished(&summary);
        info!(
            outcome = ?summary.outcome,
            file_matches = summary.file_matches,
            line_matches = summary.line_matches,
            elapsed = ?summary.elapsed,
            "search finished"
        );

        output
    }

    fn run<E: ArchiveEntry>(
        &self,
        ctx: &CancellationToken,
        entries: &[E],
        matcher: &CompiledMatcher,
    ) -> SearchOutput {
        let mut output = SearchOutput::new();
        let workers = self.workers.get();

        let pool = match ThreadPoolBuilder::new()
            .num_threads(workers + 2)
            .thread_name(|i| format!("archscout-search-{}", i))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                output.error = Some(SearchError::thread_pool(e.to_string()));
                return output;
            }
        };

        // Cancelled once the file match limit is reached; independent of the caller's token.
        let capped = CancellationToken::new();
        let first_error: OnceCell<SearchError> = OnceCell::new();
        let fed_all = AtomicBool::new(false);
        // Zero capacity: an entry only leaves the feeder once a worker is ready to scan it.
        let (files_tx, files_rx) = channel::bounded::<&E>(0);
        let (matches_tx, matches_rx) = channel::bounded::<FileMatch>(workers);
        let wait_group = WaitGroup::new();

        pool.in_place_scope(|s| {
            let capped = &capped;
            let first_error = &first_error;
            let fed_all = &fed_all;

            s.spawn(move |_| {
                let finished = feed(entries, files_tx, ctx, capped);
                fed_all.store(finished, Ordering::Release);
            });

            for id in 0..workers {
                let scanner = matcher.scanner();
                let files = files_rx.clone();
                let matches = matches_tx.clone();
                let done = wait_group.clone();
                s.spawn(move |_| {
                    run_worker(id, scanner, files, matches, first_error, [ctx, capped]);
                    drop(done);
                });
            }
            drop(files_rx);

            // The waiter owns the last results sender; dropping it closes the queue.
            s.spawn(move |_| {
                wait_group.wait();
                debug!("all workers finished");
                drop(matches_tx);
            });

            for fm in matches_rx.iter() {
                output.file_matches.push(fm);
                if output.file_matches.len() >= MAX_FILE_MATCHES {
                    debug!(limit = MAX_FILE_MATCHES, "file match limit reached");
                    output.outcome = SearchOutcome::Capped;
                    capped.cancel();
                    let dropped = matches_rx.iter().count();
                    trace!(dropped, "drained in-flight results");
                    break;
                }
            }
        });

        output.error = first_error.into_inner();
        output.outcome = if output.error.is_some() {
            SearchOutcome::Failed
        } else if output.outcome == SearchOutcome::Capped {
            SearchOutcome::Capped
        } else if ctx.is_cancelled() && !fed_all.load(Ordering::Acquire) {
            SearchOutcome::Cancelled
        } else {
            SearchOutcome::Completed
        };
        output
    }
}

/// Hands entries to workers until they run out, a token is cancelled, or no worker is left.
///
/// Returns whether every entry was handed out.
fn feed<'a, E: ArchiveEntry>(
    entries: &'a [E],
    files: Sender<&'a E>,
    ctx: &CancellationToken,
    capped: &CancellationToken,
) -> bool {
    let (cancelled, limit) = (ctx.done(), capped.done());
    for (i, entry) in entries.iter().enumerate() {
        if ctx.is_cancelled() || capped.is_cancelled() {
            debug!(remaining = entries.len() - i, "feed stopped by cancellation");
            return false;
        }
        crossbeam::select! {
            send(files, entry) -> res => {
                if res.is_err() {
                    debug!(remaining = entries.len() - i, "feed stopped, no workers left");
                    return false;
                }
            }
            recv(cancelled) -> _ => {
                debug!(remaining = entries.len() - i, "feed stopped by cancellation");
                return false;
            }
            recv(limit) -> _ => {
                debug!(remaining = entries.len() - i, "feed stopped at match limit");
                return false;
            }
        }
    }
    true
}

/// Scans entries until the queue closes.
///
/// Entries received after either token is cancelled are skipped unopened. The worker that
/// records the call's first error discards whatever is still queued before it exits.
fn run_worker<E: ArchiveEntry>(
    id: usize,
    mut scanner: Scanner,
    files: Receiver<&E>,
    matches: Sender<FileMatch>,
    first_error: &OnceCell<SearchError>,
    stop: [&CancellationToken; 2],
) {
    for entry in files.iter() {
        if stop.iter().any(|token| token.is_cancelled()) {
            trace!(worker = id, path = entry.name(), "skipping entry after cancellation");
            continue;
        }
        trace!(worker = id, path = entry.name(), "scanning entry");
        match scanner.find_entry(entry) {
            Ok(fm) if fm.line_matches.is_empty() => {}
            Ok(fm) => {
                if matches.send(fm).is_err() {
                    return;
                }
            }
            Err(err) => {
                warn!(worker = id, path = entry.name(), error = %err, "failed to search entry");
                match first_error.set(err) {
                    Ok(()) => {
                        let discarded = files.iter().count();
                        debug!(worker = id, discarded, "discarded queued entries after error");
                    }
                    Err(err) => {
                        debug!(worker = id, error = %err, "search error already recorded");
                    }
                }
                return;
            }
        }
    }
}
