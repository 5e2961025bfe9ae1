//! Shared data model and event surface for the medialift uploader.
//!
//! This is the leaf crate of the workspace: input and outcome types for
//! one upload session, the typed lifecycle event enum, and the in-process
//! event bus every other component publishes through.

pub mod constants;
pub mod events;
pub mod types;

pub use events::{EventBus, EventKind, SubscriptionId, UploadEvent};
pub use types::{
    FailedFile, MediaInfo, MediaKind, ProcessedFile, SkippedFile, SourceFile, UploadSummary,
    UploadedFile,
};
