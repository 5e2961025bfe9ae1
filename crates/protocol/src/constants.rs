//! Shared defaults for an upload session.

use std::time::Duration;

/// Default maximum image width before a resize is forced.
pub const DEFAULT_MAX_WIDTH: u32 = 4000;

/// Default maximum image height before a resize is forced.
pub const DEFAULT_MAX_HEIGHT: u32 = 4000;

/// Size ceiling for image uploads, in bytes. Files at or above the
/// ceiling are skipped, not truncated.
pub const DEFAULT_MAX_PIC_FILE_SIZE: u64 = 6_999_000;

/// Size ceiling for video uploads, in bytes.
pub const DEFAULT_MAX_VID_FILE_SIZE: u64 = 9_999_000;

/// Minimum wall-clock gap between two aggregate progress events.
///
/// Triggers arriving inside the window are dropped, not queued; the
/// final summary always carries the complete totals.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(160);

/// Transfer concurrency used when the platform parallelism hint is
/// unavailable.
pub const FALLBACK_CONCURRENCY: usize = 4;

/// Upper bound on a single transfer before it is failed as wedged.
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(300);
