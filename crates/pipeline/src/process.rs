//! The per-file processing pipeline.

use std::sync::Arc;

use chrono::Utc;
use medialift_protocol::constants::{
    DEFAULT_MAX_HEIGHT, DEFAULT_MAX_PIC_FILE_SIZE, DEFAULT_MAX_VID_FILE_SIZE, DEFAULT_MAX_WIDTH,
};
use medialift_protocol::{FailedFile, MediaKind, ProcessedFile, SkippedFile, SourceFile};
use tracing::{debug, warn};

use crate::PipelineError;
use crate::inspect::MediaInspector;
use crate::rename::object_key;
use crate::resize::{Resizer, fit_within};

/// Size and dimension ceilings applied during processing.
#[derive(Debug, Clone, Copy)]
pub struct PipelineLimits {
    pub max_width: u32,
    pub max_height: u32,
    pub max_pic_file_size: u64,
    pub max_vid_file_size: u64,
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            max_pic_file_size: DEFAULT_MAX_PIC_FILE_SIZE,
            max_vid_file_size: DEFAULT_MAX_VID_FILE_SIZE,
        }
    }
}

/// Terminal decision for one file leaving the pipeline.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// The file enters the pack, queued for transfer.
    Accepted(ProcessedFile),
    /// Rejected by the size gate.
    Skipped(SkippedFile),
    /// Inspection or resize failed.
    Failed(FailedFile),
}

/// Runs size gate → inspection → resize decision → rename for one file.
pub struct FilePipeline {
    limits: PipelineLimits,
    prefix: Vec<String>,
    inspector: Arc<dyn MediaInspector>,
    resizer: Arc<dyn Resizer>,
}

impl FilePipeline {
    pub fn new(
        limits: PipelineLimits,
        prefix: Vec<String>,
        inspector: Arc<dyn MediaInspector>,
        resizer: Arc<dyn Resizer>,
    ) -> Self {
        Self {
            limits,
            prefix,
            inspector,
            resizer,
        }
    }

    /// Processes one file to a terminal decision. Transformation errors
    /// come back as [`ProcessOutcome::Failed`], never as a panic or an
    /// `Err` that would abort the batch.
    pub async fn process(&self, file: &SourceFile) -> ProcessOutcome {
        let kind = file.kind();
        if !self.size_ok(file, kind) {
            debug!(name = %file.name, size = file.size(), "rejected by size gate");
            return ProcessOutcome::Skipped(SkippedFile {
                message: "file size too large".into(),
                size: file.size(),
                name: file.name.clone(),
            });
        }

        match self.transform(file, kind).await {
            Ok(processed) => ProcessOutcome::Accepted(processed),
            Err(err) => {
                warn!(name = %file.name, error = %err, "processing failed");
                ProcessOutcome::Failed(FailedFile {
                    message: err.to_string(),
                    size: file.size(),
                    name: file.name.clone(),
                })
            }
        }
    }

    async fn transform(
        &self,
        file: &SourceFile,
        kind: MediaKind,
    ) -> Result<ProcessedFile, PipelineError> {
        let mut info = self.inspector.inspect(&file.data, kind).await?;

        let mut data = file.data.clone();
        if kind == MediaKind::Image
            && let (Some(w), Some(h)) = (info.width, info.height)
            && let Some((tw, th)) = fit_within(w, h, self.limits.max_width, self.limits.max_height)
        {
            debug!(name = %file.name, from = %format!("{w}x{h}"), to = %format!("{tw}x{th}"), "resizing");
            data = self.resizer.resize(&data, tw, th).await?;
            info.width = Some(tw);
            info.height = Some(th);
        }
        info.size = data.len() as u64;

        let key = object_key(&self.prefix, &file.name, Utc::now().timestamp_millis());

        Ok(ProcessedFile {
            original_name: file.name.clone(),
            object_key: key,
            mime_type: file.mime_type.clone(),
            kind,
            size: data.len() as u64,
            info,
            data,
        })
    }

    fn size_ok(&self, file: &SourceFile, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Image => file.size() < self.limits.max_pic_file_size,
            MediaKind::Video => file.size() < self.limits.max_vid_file_size,
            MediaKind::Other => false,
        }
    }
}
