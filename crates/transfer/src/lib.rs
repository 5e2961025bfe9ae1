//! Transport abstraction, HTTP multipart transport, and throttled
//! progress aggregation.
//!
//! The [`Transport`] trait is the seam between the scheduler and the
//! wire; [`HttpTransport`] is the shipped implementation speaking
//! object-storage POST-policy forms.

mod form;
mod http;
mod progress;
mod transport;

pub use form::{ResolvedTarget, UploadFormInputs, UploadTarget, fetch_form_inputs};
pub use http::HttpTransport;
pub use progress::{ProgressAggregator, RecordId};
pub use transport::{ProgressFn, TransferReceipt, Transport};

/// Errors produced while talking to the storage endpoint.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upload rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("no location in storage response")]
    MissingLocation,

    #[error("invalid credentials response: {0}")]
    Credentials(String),

    #[error("transfer timed out")]
    TimedOut,

    #[error("cancelled")]
    Cancelled,
}
