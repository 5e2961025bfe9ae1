//! Throttled aggregation of per-transfer progress into one event stream.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use medialift_protocol::{EventBus, UploadEvent};

/// Identifies one transfer's progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(u64);

struct ProgressRecord {
    /// Post-processing size decided before the transfer started.
    expected_size: u64,
    transferred: u64,
    reported_total: u64,
}

struct AggState {
    next_id: u64,
    records: HashMap<u64, ProgressRecord>,
    last_emit: Option<Instant>,
}

/// Reconciles many concurrently updating transfers into one throttled
/// `Progress` event stream.
///
/// The denominator (`accumulated_size`, the sum of post-processing file
/// sizes) is fixed before any transfer starts — transfers never change
/// it. Emission is rate-limited to one event per interval; triggers
/// inside the cool-down are dropped, not queued, so the very last
/// in-window update may only become visible through the final summary.
pub struct ProgressAggregator {
    state: Mutex<AggState>,
    bus: Arc<EventBus>,
    /// Count of files in a terminal state, shared with the session.
    done: Arc<AtomicUsize>,
    accumulated_size: u64,
    total_files: usize,
    interval: Duration,
}

impl ProgressAggregator {
    pub fn new(
        bus: Arc<EventBus>,
        done: Arc<AtomicUsize>,
        accumulated_size: u64,
        total_files: usize,
        interval: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(AggState {
                next_id: 0,
                records: HashMap::new(),
                last_emit: None,
            }),
            bus,
            done,
            accumulated_size,
            total_files,
            interval,
        }
    }

    /// Registers a transfer that is about to start. Records are retained
    /// for the session's lifetime; the final summary reads their totals.
    pub fn begin(&self, expected_size: u64) -> RecordId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.records.insert(
            id,
            ProgressRecord {
                expected_size,
                transferred: 0,
                reported_total: 0,
            },
        );
        RecordId(id)
    }

    /// Records cumulative progress for one transfer, then recomputes and
    /// emits the aggregate unless the throttle window is still open.
    pub fn record(&self, id: RecordId, transferred: u64, total: u64) {
        let mut state = self.state.lock().unwrap();
        let Some(record) = state.records.get_mut(&id.0) else {
            return;
        };
        record.transferred = record.transferred.max(transferred);
        record.reported_total = record.reported_total.max(total);

        let now = Instant::now();
        let due = match state.last_emit {
            None => true,
            Some(prev) => now.duration_since(prev) >= self.interval,
        };
        if !due {
            return;
        }
        state.last_emit = Some(now);
        let percent = self.percent(&state);
        drop(state);

        self.bus.publish(&UploadEvent::Progress {
            percent,
            total_files: self.total_files,
            uploaded: self.done.load(Ordering::SeqCst),
        });
    }

    /// Sum of transport-reported totals, for the final summary.
    pub fn reported_total_bytes(&self) -> u64 {
        let state = self.state.lock().unwrap();
        state.records.values().map(|r| r.reported_total).sum()
    }

    fn percent(&self, state: &AggState) -> u8 {
        if self.accumulated_size == 0 {
            return 0;
        }
        // Per-record contribution is capped at its expected size, so a
        // transport reporting envelope bytes cannot push the aggregate
        // past the denominator.
        let transferred: u64 = state
            .records
            .values()
            .map(|r| r.transferred.min(r.expected_size))
            .sum();
        let percent = (transferred as f64 / self.accumulated_size as f64 * 100.0).floor() as u64;
        percent.min(100) as u8
    }
}
