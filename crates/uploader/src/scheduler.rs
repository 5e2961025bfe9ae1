//! Bounded-concurrency drain of the transfer pack.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use medialift_protocol::{EventBus, FailedFile, ProcessedFile, UploadEvent, UploadedFile};
use medialift_transfer::{ProgressAggregator, ProgressFn, TransferError, Transport};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::session::Session;

/// Drains processed files through a fixed-size transfer pool.
///
/// A new transfer starts the instant a slot frees; completion order is
/// whatever the network gives us. Every item reaches a terminal outcome
/// before [`run`](Self::run) resolves — including on cancellation, so
/// the session totals always reconcile.
pub(crate) struct TransferScheduler {
    transport: Arc<dyn Transport>,
    concurrency: usize,
    timeout: Duration,
    cancel: CancellationToken,
}

enum TransferOutcome {
    Uploaded(UploadedFile),
    Failed(FailedFile),
}

impl TransferScheduler {
    pub fn new(
        transport: Arc<dyn Transport>,
        concurrency: usize,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            concurrency: concurrency.max(1),
            timeout,
            cancel,
        }
    }

    /// Runs every pack item to a terminal state.
    pub async fn run(
        &self,
        pack: Vec<ProcessedFile>,
        session: &Arc<Session>,
        aggregator: &Arc<ProgressAggregator>,
        bus: &Arc<EventBus>,
    ) {
        let mut queue: VecDeque<ProcessedFile> = pack.into();
        let mut in_flight: JoinSet<TransferOutcome> = JoinSet::new();
        // Task id -> (name, size), to account for tasks that die without
        // returning an outcome.
        let mut labels: HashMap<tokio::task::Id, (String, u64)> = HashMap::new();

        debug!(
            queued = queue.len(),
            ceiling = self.concurrency,
            "transfer drain started"
        );

        while !queue.is_empty() || !in_flight.is_empty() {
            if self.cancel.is_cancelled() {
                if in_flight.is_empty() {
                    // Queued items never start; fail them so every file
                    // still reaches a terminal state.
                    while let Some(file) = queue.pop_front() {
                        self.settle(
                            TransferOutcome::Failed(FailedFile {
                                message: TransferError::Cancelled.to_string(),
                                size: file.size,
                                name: file.original_name,
                            }),
                            session,
                            bus,
                        );
                    }
                    continue;
                }
            } else {
                while in_flight.len() < self.concurrency {
                    let Some(file) = queue.pop_front() else {
                        break;
                    };
                    let name = file.original_name.clone();
                    let size = file.size;
                    let handle = in_flight.spawn(Self::transfer_one(
                        Arc::clone(&self.transport),
                        file,
                        Arc::clone(aggregator),
                        self.timeout,
                        self.cancel.clone(),
                    ));
                    labels.insert(handle.id(), (name, size));
                }
            }

            match in_flight.join_next_with_id().await {
                Some(Ok((id, outcome))) => {
                    labels.remove(&id);
                    self.settle(outcome, session, bus);
                }
                Some(Err(join_err)) => {
                    // A panicked task still has to account for its file.
                    let (name, size) = labels.remove(&join_err.id()).unwrap_or_default();
                    error!(name = %name, error = %join_err, "transfer task died");
                    self.settle(
                        TransferOutcome::Failed(FailedFile {
                            message: format!("transfer task died: {join_err}"),
                            size,
                            name,
                        }),
                        session,
                        bus,
                    );
                }
                None => {}
            }
        }

        debug!("transfer drain finished");
    }

    async fn transfer_one(
        transport: Arc<dyn Transport>,
        file: ProcessedFile,
        aggregator: Arc<ProgressAggregator>,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> TransferOutcome {
        let record = aggregator.begin(file.size);
        let progress: ProgressFn = {
            let aggregator = Arc::clone(&aggregator);
            Arc::new(move |transferred, total| aggregator.record(record, transferred, total))
        };

        let attempt = transport.transfer(&file, progress);
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(TransferError::Cancelled),
            outcome = tokio::time::timeout(timeout, attempt) => {
                outcome.unwrap_or(Err(TransferError::TimedOut))
            }
        };

        match result {
            Ok(receipt) => TransferOutcome::Uploaded(UploadedFile {
                info: file.info.clone(),
                location: receipt.location,
                size: receipt.size,
            }),
            Err(err) => {
                if matches!(err, TransferError::TimedOut) {
                    warn!(name = %file.original_name, "transfer exceeded liveness timeout");
                }
                TransferOutcome::Failed(FailedFile {
                    message: err.to_string(),
                    size: file.size,
                    name: file.original_name,
                })
            }
        }
    }

    fn settle(&self, outcome: TransferOutcome, session: &Arc<Session>, bus: &Arc<EventBus>) {
        match outcome {
            TransferOutcome::Uploaded(uploaded) => {
                debug!(location = %uploaded.location, "upload recorded");
                session.record_upload(uploaded.clone());
                bus.publish(&UploadEvent::Uploaded(uploaded));
            }
            TransferOutcome::Failed(failed) => {
                warn!(name = %failed.name, error = %failed.message, "transfer failed");
                session.record_failure(failed.clone());
                bus.publish(&UploadEvent::Failed(failed));
            }
        }
    }
}
