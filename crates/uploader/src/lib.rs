//! Upload session orchestration.
//!
//! One [`Uploader`] owns a session: it resolves the transport target,
//! runs every input through the processing pipeline in order, drains the
//! surviving pack through a bounded transfer pool, and publishes typed
//! lifecycle events ending in exactly one summary.

mod error;
mod options;
mod scheduler;
mod session;
mod uploader;

pub use error::UploadError;
pub use options::UploaderOptions;
pub use uploader::Uploader;

// Re-export the types callers need to drive a session.
pub use medialift_protocol::{
    EventBus, EventKind, SourceFile, SubscriptionId, UploadEvent, UploadSummary,
};
pub use medialift_transfer::UploadTarget;
