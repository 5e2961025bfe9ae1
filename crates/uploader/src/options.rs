//! Session options and defaults.

use std::time::Duration;

use medialift_protocol::constants::{
    DEFAULT_MAX_HEIGHT, DEFAULT_MAX_PIC_FILE_SIZE, DEFAULT_MAX_VID_FILE_SIZE, DEFAULT_MAX_WIDTH,
    DEFAULT_TRANSFER_TIMEOUT, FALLBACK_CONCURRENCY, PROGRESS_INTERVAL,
};
use medialift_transfer::UploadTarget;

/// Options for one upload session.
///
/// Size and dimension ceilings default to the service limits; only the
/// target must be supplied.
#[derive(Debug, Clone)]
pub struct UploaderOptions {
    pub target: UploadTarget,
    pub max_width: u32,
    pub max_height: u32,
    pub max_pic_file_size: u64,
    pub max_vid_file_size: u64,
    /// Extra object-key prefix segments, appended after any tenant
    /// directory the target resolution yields.
    pub directory_prefix: Vec<String>,
    /// Transfer pool ceiling. `None` uses the platform parallelism hint.
    pub concurrency: Option<usize>,
    /// Liveness bound on a single transfer.
    pub transfer_timeout: Duration,
    /// Aggregate progress emission interval.
    pub progress_interval: Duration,
}

impl UploaderOptions {
    pub fn new(target: UploadTarget) -> Self {
        Self {
            target,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            max_pic_file_size: DEFAULT_MAX_PIC_FILE_SIZE,
            max_vid_file_size: DEFAULT_MAX_VID_FILE_SIZE,
            directory_prefix: Vec::new(),
            concurrency: None,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
            progress_interval: PROGRESS_INTERVAL,
        }
    }

    /// Effective transfer concurrency: the explicit option, else the
    /// platform parallelism hint, else the fixed fallback.
    pub(crate) fn effective_concurrency(&self) -> usize {
        self.concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(FALLBACK_CONCURRENCY)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_limits() {
        let options = UploaderOptions::new(UploadTarget::Direct {
            upload_url: "https://x.example".into(),
            prefix: None,
        });
        assert_eq!(options.max_width, 4000);
        assert_eq!(options.max_height, 4000);
        assert_eq!(options.max_pic_file_size, 6_999_000);
        assert_eq!(options.max_vid_file_size, 9_999_000);
        assert_eq!(options.progress_interval, Duration::from_millis(160));
        assert!(options.concurrency.is_none());
    }

    #[test]
    fn explicit_concurrency_wins() {
        let mut options = UploaderOptions::new(UploadTarget::Direct {
            upload_url: "https://x.example".into(),
            prefix: None,
        });
        options.concurrency = Some(2);
        assert_eq!(options.effective_concurrency(), 2);
    }

    #[test]
    fn effective_concurrency_is_positive() {
        let options = UploaderOptions::new(UploadTarget::Direct {
            upload_url: "https://x.example".into(),
            prefix: None,
        });
        assert!(options.effective_concurrency() >= 1);
    }
}
