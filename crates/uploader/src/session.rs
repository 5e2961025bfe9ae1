//! Mutable session state shared by the processing pass and the
//! scheduler.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use medialift_protocol::{FailedFile, SkippedFile, UploadSummary, UploadedFile};

/// Outcome collections and counters for one upload run.
///
/// The scheduler appends from real tasks, so the lists live behind a
/// lock and `done` is an atomic shared with the progress aggregator.
/// Outcome lists are append-only and kept in completion order.
pub(crate) struct Session {
    total_files: usize,
    done: Arc<AtomicUsize>,
    outcomes: Mutex<Outcomes>,
}

#[derive(Default)]
struct Outcomes {
    uploaded: Vec<UploadedFile>,
    skipped: Vec<SkippedFile>,
    failed: Vec<FailedFile>,
    summary_sent: bool,
}

impl Session {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            done: Arc::new(AtomicUsize::new(0)),
            outcomes: Mutex::new(Outcomes::default()),
        }
    }

    /// Shared handle on the terminal-state counter.
    pub fn done_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.done)
    }

    pub fn record_skip(&self, skipped: SkippedFile) {
        let mut outcomes = self.outcomes.lock().unwrap();
        outcomes.skipped.push(skipped);
        self.done.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_failure(&self, failed: FailedFile) {
        let mut outcomes = self.outcomes.lock().unwrap();
        outcomes.failed.push(failed);
        self.done.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_upload(&self, uploaded: UploadedFile) {
        let mut outcomes = self.outcomes.lock().unwrap();
        outcomes.uploaded.push(uploaded);
        self.done.fetch_add(1, Ordering::SeqCst);
    }

    /// Claims the exactly-once right to emit the summary. Returns `true`
    /// only when every file is terminal and nobody claimed it before.
    pub fn try_finish(&self) -> bool {
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.summary_sent || self.done.load(Ordering::SeqCst) < self.total_files {
            return false;
        }
        outcomes.summary_sent = true;
        true
    }

    pub fn summary(&self, total_bytes: u64) -> UploadSummary {
        let outcomes = self.outcomes.lock().unwrap();
        UploadSummary {
            uploaded: outcomes.uploaded.len(),
            total_bytes,
            uploaded_files: outcomes.uploaded.clone(),
            skipped: outcomes.skipped.clone(),
            failed: outcomes.failed.clone(),
        }
    }
}
