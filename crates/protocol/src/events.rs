//! Typed lifecycle events and the in-process event bus.

use std::sync::RwLock;

use crate::types::{FailedFile, ProcessedFile, SkippedFile, UploadSummary, UploadedFile};

/// Lifecycle event published during an upload session.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// The session accepted its inputs and started processing.
    Started { total_files: usize },
    /// One file finished the processing pipeline. `file` is `None` when
    /// it was skipped or failed before entering the pack.
    Processed {
        file: Option<ProcessedFile>,
        /// Zero-based index of the file in the input order.
        processed: usize,
        total: usize,
    },
    /// A file was rejected by the size gate.
    Skipped(SkippedFile),
    /// Throttled aggregate progress across all in-flight transfers.
    Progress {
        percent: u8,
        total_files: usize,
        /// Files that have reached a terminal state so far.
        uploaded: usize,
    },
    /// A transfer completed.
    Uploaded(UploadedFile),
    /// A file failed processing or transfer.
    Failed(FailedFile),
    /// Every file reached a terminal state. Fires exactly once.
    Done(UploadSummary),
}

/// Discriminant used for subscription routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Started,
    Processed,
    Skipped,
    Progress,
    Uploaded,
    Failed,
    Done,
}

impl UploadEvent {
    /// Returns the kind handlers subscribe under.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Started { .. } => EventKind::Started,
            Self::Processed { .. } => EventKind::Processed,
            Self::Skipped(_) => EventKind::Skipped,
            Self::Progress { .. } => EventKind::Progress,
            Self::Uploaded(_) => EventKind::Uploaded,
            Self::Failed(_) => EventKind::Failed,
            Self::Done(_) => EventKind::Done,
        }
    }
}

/// Handler invoked synchronously for each published event of its kind.
pub type EventHandler = Box<dyn Fn(&UploadEvent) + Send + Sync>;

/// Opaque handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: u64,
    kind: EventKind,
    handler: EventHandler,
}

/// In-process publish/subscribe registry.
///
/// Fan-out is synchronous and in subscription order. No persistence and
/// no back-pressure; removal takes effect for future dispatches. The
/// subscriber list is read-locked during dispatch, so handlers must not
/// subscribe or unsubscribe from within a handler.
pub struct EventBus {
    inner: RwLock<BusInner>,
}

struct BusInner {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BusInner {
                next_id: 0,
                subscribers: Vec::new(),
            }),
        }
    }

    /// Registers a handler for one event kind.
    pub fn subscribe(
        &self,
        kind: EventKind,
        handler: impl Fn(&UploadEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut inner = self.inner.write().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push(Subscriber {
            id,
            kind,
            handler: Box::new(handler),
        });
        SubscriptionId(id)
    }

    /// Removes a handler. Returns `false` if the id was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.write().unwrap();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|s| s.id != id.0);
        inner.subscribers.len() != before
    }

    /// Dispatches an event to every handler subscribed to its kind.
    pub fn publish(&self, event: &UploadEvent) {
        let kind = event.kind();
        let inner = self.inner.read().unwrap();
        for subscriber in inner.subscribers.iter().filter(|s| s.kind == kind) {
            (subscriber.handler)(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
