use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::results::SearchOutcome;

/// What a finished search call reports to its [`MetricsRecorder`]
#[derive(Debug, Clone, Copy)]
pub struct SearchSummary {
    pub outcome: SearchOutcome,
    pub file_matches: usize,
    pub line_matches: usize,
    pub elapsed: Duration,
}

/// Receives search lifecycle events from the dispatcher
pub trait MetricsRecorder: Send + Sync {
    /// Called before any entry is handed to a worker
    fn search_started(&self, files: usize);

    /// Called once all workers have exited
    fn search_finished(&self, summary: &SearchSummary);
}

/// Recorder that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl MetricsRecorder for NoopRecorder {
    fn search_started(&self, _files: usize) {}

    fn search_finished(&self, _summary: &SearchSummary) {}
}

/// Counts searches with atomic counters; clones share the counters
#[derive(Debug, Clone, Default)]
pub struct SearchMetrics {
    searches_started: Arc<AtomicU64>,
    searches_completed: Arc<AtomicU64>,
    searches_capped: Arc<AtomicU64>,
    searches_cancelled: Arc<AtomicU64>,
    searches_failed: Arc<AtomicU64>,
    in_flight: Arc<AtomicU64>,
    files_offered: Arc<AtomicU64>,
    file_matches: Arc<AtomicU64>,
    line_matches: Arc<AtomicU64>,
    total_micros: Arc<AtomicU64>,
}

impl SearchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a snapshot of the counters
    pub fn get_stats(&self) -> SearchStats {
        SearchStats {
            searches_started: self.searches_started.load(Ordering::Relaxed),
            searches_completed: self.searches_completed.load(Ordering::Relaxed),
            searches_capped: self.searches_capped.load(Ordering::Relaxed),
            searches_cancelled: self.searches_cancelled.load(Ordering::Relaxed),
            searches_failed: self.searches_failed.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
            files_offered: self.files_offered.load(Ordering::Relaxed),
            file_matches: self.file_matches.load(Ordering::Relaxed),
            line_matches: self.line_matches.load(Ordering::Relaxed),
            total_time: Duration::from_micros(self.total_micros.load(Ordering::Relaxed)),
        }
    }

    /// Logs the current counters
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Search stats:\n\
             Searches (started/completed/capped/cancelled/failed): {}/{}/{}/{}/{}\n\
             Files offered: {}\n\
             Matches (files/lines): {}/{}\n\
             Total search time: {:?}",
            stats.searches_started,
            stats.searches_completed,
            stats.searches_capped,
            stats.searches_cancelled,
            stats.searches_failed,
            stats.files_offered,
            stats.file_matches,
            stats.line_matches,
            stats.total_time
        );
    }
}

impl MetricsRecorder for SearchMetrics {
    fn search_started(&self, files: usize) {
        self.searches_started.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        self.files_offered.fetch_add(files as u64, Ordering::Relaxed);
    }

    fn search_finished(&self, summary: &SearchSummary) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
        let counter = match summary.outcome {
            SearchOutcome::Completed => &self.searches_completed,
            SearchOutcome::Capped => &self.searches_capped,
            SearchOutcome::Cancelled => &self.searches_cancelled,
            SearchOutcome::Failed => &self.searches_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.file_matches
            .fetch_add(summary.file_matches as u64, Ordering::Relaxed);
        self.line_matches
            .fetch_add(summary.line_matches as u64, Ordering::Relaxed);
        self.total_micros
            .fetch_add(summary.elapsed.as_micros() as u64, Ordering::Relaxed);
    }
}

/// Snapshot of [`SearchMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    pub searches_started: u64,
    pub searches_completed: u64,
    pub searches_capped: u64,
    pub searches_cancelled: u64,
    pub searches_failed: u64,
    pub in_flight: u64,
    pub files_offered: u64,
    pub file_matches: u64,
    pub line_matches: u64,
    pub total_time: Duration,
}
