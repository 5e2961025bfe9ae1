//! Per-file processing: size gate → inspection → resize decision → rename.
//!
//! [`FilePipeline::process`] turns a [`medialift_protocol::SourceFile`]
//! into a terminal [`ProcessOutcome`]; it never fails outright, every
//! transformation error becomes a recorded per-file outcome.

mod inspect;
mod process;
mod rename;
mod resize;

pub use inspect::{ExifInspector, MediaInspector};
pub use process::{FilePipeline, PipelineLimits, ProcessOutcome};
pub use rename::{object_key, sanitize_file_name};
pub use resize::{ImageResizer, Resizer, fit_within};

/// Errors produced while transforming a single file.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("inspection failed: {0}")]
    Inspect(String),

    #[error("resize failed: {0}")]
    Resize(String),
}
