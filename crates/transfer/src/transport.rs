//! Transport seam between the scheduler and the wire.

use std::sync::Arc;

use async_trait::async_trait;
use medialift_protocol::ProcessedFile;

use crate::TransferError;

/// Progress callback: cumulative `(transferred, total)` bytes for one
/// transfer.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Terminal result of a successful transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Remote location of the stored object.
    pub location: String,
    /// Bytes of payload the endpoint accepted.
    pub size: u64,
}

/// One-shot transfer of a processed file to remote storage.
///
/// Implementations invoke `progress` zero or more times before
/// resolving. A trait keeps the scheduler transport-agnostic and
/// testable with mocks; failures are terminal, retry is the caller's
/// business.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn transfer(
        &self,
        file: &ProcessedFile,
        progress: ProgressFn,
    ) -> Result<TransferReceipt, TransferError>;
}
