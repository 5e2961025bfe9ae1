//! Session-level errors.

/// Errors surfaced from session initialization.
///
/// These are fatal: nothing downstream runs. Per-file errors never
/// appear here — they are recorded as outcomes and events instead.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Signed-form mode without a credentials endpoint.
    #[error("missing credential endpoint")]
    MissingCredentialsEndpoint,

    /// Direct mode without an upload URL.
    #[error("missing upload URL")]
    MissingUploadUrl,

    /// The credentials endpoint rejected or garbled the form-input fetch.
    #[error("credential fetch failed: {0}")]
    Credentials(#[from] medialift_transfer::TransferError),
}
