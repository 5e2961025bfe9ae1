//! Data types for one upload session.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Coarse media category derived from a MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    /// Anything else; always rejected by the size gate.
    Other,
}

impl MediaKind {
    /// Classifies a MIME type by its top-level category.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("video/") {
            Self::Video
        } else {
            Self::Other
        }
    }
}

/// An input file queued for upload. Immutable once added.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl SourceFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Size of the raw payload in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Coarse category of this file's MIME type.
    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.mime_type)
    }
}

/// Dimensions and descriptive tags produced by inspection.
///
/// `width`/`height` hold the *final* dimensions once the resize decision
/// has been applied; `size` the post-transform byte count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default)]
    pub size: u64,
}

/// A file that survived processing and is queued for transfer.
///
/// Created once by the processing pipeline, consumed once by the
/// scheduler. `mime_type` keeps the original type even after a JPEG
/// re-encode.
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub original_name: String,
    /// Remote object key: `{prefix}/{timestamp}_{sanitized_name}`.
    pub object_key: String,
    pub mime_type: String,
    pub kind: MediaKind,
    /// Post-transform payload size in bytes.
    pub size: u64,
    pub info: MediaInfo,
    pub data: Bytes,
}

/// Terminal record for a file rejected by the size gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    pub message: String,
    pub size: u64,
    pub name: String,
}

/// Terminal record for a file that failed processing or transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedFile {
    pub message: String,
    pub size: u64,
    pub name: String,
}

/// Terminal record for a completed transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub info: MediaInfo,
    /// Remote location reported by the storage endpoint.
    pub location: String,
    pub size: u64,
}

/// Final tally for a session; every input file appears in exactly one of
/// the three outcome lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    /// Count of successful transfers.
    pub uploaded: usize,
    /// Sum of transport-reported totals across all transfers.
    pub total_bytes: u64,
    pub uploaded_files: Vec<UploadedFile>,
    pub skipped: Vec<SkippedFile>,
    pub failed: Vec<FailedFile>,
}
