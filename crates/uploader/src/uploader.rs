//! Top-level upload session coordinator.

use std::sync::Arc;

use medialift_pipeline::{
    ExifInspector, FilePipeline, ImageResizer, MediaInspector, PipelineLimits, ProcessOutcome,
    Resizer,
};
use medialift_protocol::{
    EventBus, EventKind, SourceFile, SubscriptionId, UploadEvent, UploadSummary,
};
use medialift_transfer::{
    HttpTransport, ProgressAggregator, ResolvedTarget, Transport, UploadTarget, fetch_form_inputs,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::UploadError;
use crate::options::UploaderOptions;
use crate::scheduler::TransferScheduler;
use crate::session::Session;

/// Coordinates one batch upload session end to end.
///
/// Create with [`Uploader::init`], queue inputs with
/// [`add_file`](Self::add_file), subscribe to [`UploadEvent`]s, then call
/// [`start`](Self::start) once. The session is read-only after the
/// `Done` event fires.
pub struct Uploader {
    options: UploaderOptions,
    resolved: ResolvedTarget,
    transport: Arc<dyn Transport>,
    inspector: Arc<dyn MediaInspector>,
    resizer: Arc<dyn Resizer>,
    bus: Arc<EventBus>,
    cancel: CancellationToken,
    files: Vec<SourceFile>,
}

impl Uploader {
    /// Resolves the transport configuration and builds the session.
    ///
    /// Fatal on configuration errors: a missing endpoint or URL, or a
    /// failing credential fetch, aborts here and nothing downstream
    /// runs.
    pub async fn init(options: UploaderOptions) -> Result<Self, UploadError> {
        let client = reqwest::Client::new();
        let resolved = match &options.target {
            UploadTarget::SignedForm {
                credentials_endpoint,
            } => {
                if credentials_endpoint.is_empty() {
                    return Err(UploadError::MissingCredentialsEndpoint);
                }
                fetch_form_inputs(&client, credentials_endpoint).await?
            }
            UploadTarget::Direct { upload_url, prefix } => {
                if upload_url.is_empty() {
                    return Err(UploadError::MissingUploadUrl);
                }
                ResolvedTarget::direct(upload_url, prefix.clone())
            }
        };

        let transport = Arc::new(HttpTransport::new(client, resolved.clone()));
        Ok(Self::with_parts(
            options,
            resolved,
            transport,
            Arc::new(ExifInspector),
            Arc::new(ImageResizer),
        ))
    }

    /// Builds a session from explicit collaborators. The supported seam
    /// for custom transports, inspectors, or resizers — and for tests.
    pub fn with_parts(
        options: UploaderOptions,
        resolved: ResolvedTarget,
        transport: Arc<dyn Transport>,
        inspector: Arc<dyn MediaInspector>,
        resizer: Arc<dyn Resizer>,
    ) -> Self {
        Self {
            options,
            resolved,
            transport,
            inspector,
            resizer,
            bus: Arc::new(EventBus::new()),
            cancel: CancellationToken::new(),
            files: Vec::new(),
        }
    }

    /// Queues an input file.
    pub fn add_file(&mut self, file: SourceFile) {
        self.files.push(file);
    }

    /// Registers an event handler; see [`EventBus::subscribe`].
    pub fn subscribe(
        &self,
        kind: EventKind,
        handler: impl Fn(&UploadEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(kind, handler)
    }

    /// Removes an event handler.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Token for aborting the session mid-run. Cancelled transfers and
    /// never-started queue items are recorded as failures so the summary
    /// still fires.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the session to completion and returns the summary.
    ///
    /// Processing is sequential and order-preserving; transfers run
    /// through the bounded pool. Every input reaches exactly one
    /// terminal state, and `Done` fires exactly once when the last one
    /// does.
    pub async fn start(&mut self) -> UploadSummary {
        let files = std::mem::take(&mut self.files);
        let total = files.len();
        self.bus.publish(&UploadEvent::Started { total_files: total });
        info!(files = total, "upload session started");

        let session = Arc::new(Session::new(total));

        let mut prefix = self.resolved.directory.clone();
        prefix.extend(self.options.directory_prefix.iter().cloned());

        let limits = PipelineLimits {
            max_width: self.options.max_width,
            max_height: self.options.max_height,
            max_pic_file_size: self.options.max_pic_file_size,
            max_vid_file_size: self.options.max_vid_file_size,
        };
        let pipeline = FilePipeline::new(
            limits,
            prefix,
            Arc::clone(&self.inspector),
            Arc::clone(&self.resizer),
        );

        // Sequential processing pass; the pack keeps input order.
        let mut pack = Vec::new();
        let mut accumulated: u64 = 0;
        for (index, file) in files.iter().enumerate() {
            let processed = match pipeline.process(file).await {
                ProcessOutcome::Accepted(processed) => {
                    accumulated += processed.size;
                    pack.push(processed.clone());
                    Some(processed)
                }
                ProcessOutcome::Skipped(skipped) => {
                    session.record_skip(skipped.clone());
                    self.bus.publish(&UploadEvent::Skipped(skipped));
                    None
                }
                ProcessOutcome::Failed(failed) => {
                    session.record_failure(failed.clone());
                    self.bus.publish(&UploadEvent::Failed(failed));
                    None
                }
            };
            self.bus.publish(&UploadEvent::Processed {
                file: processed,
                processed: index,
                total,
            });
        }

        let aggregator = Arc::new(ProgressAggregator::new(
            Arc::clone(&self.bus),
            session.done_handle(),
            accumulated,
            total,
            self.options.progress_interval,
        ));

        let scheduler = TransferScheduler::new(
            Arc::clone(&self.transport),
            self.options.effective_concurrency(),
            self.options.transfer_timeout,
            self.cancel.clone(),
        );
        scheduler.run(pack, &session, &aggregator, &self.bus).await;

        let summary = session.summary(aggregator.reported_total_bytes());
        if session.try_finish() {
            self.bus.publish(&UploadEvent::Done(summary.clone()));
            info!(
                uploaded = summary.uploaded,
                skipped = summary.skipped.len(),
                failed = summary.failed.len(),
                total_bytes = summary.total_bytes,
                "upload session finished"
            );
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use medialift_pipeline::PipelineError;
    use medialift_protocol::{MediaInfo, MediaKind, ProcessedFile};
    use medialift_transfer::{ProgressFn, TransferError, TransferReceipt};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Inspector reporting fixed dimensions for images, size-only
    /// otherwise.
    struct StubInspector;

    #[async_trait]
    impl MediaInspector for StubInspector {
        async fn inspect(&self, data: &[u8], kind: MediaKind) -> Result<MediaInfo, PipelineError> {
            let mut info = MediaInfo {
                size: data.len() as u64,
                ..MediaInfo::default()
            };
            if kind == MediaKind::Image {
                info.width = Some(640);
                info.height = Some(480);
            }
            Ok(info)
        }
    }

    struct StubResizer;

    #[async_trait]
    impl Resizer for StubResizer {
        async fn resize(&self, _: &[u8], _: u32, _: u32) -> Result<Bytes, PipelineError> {
            Ok(Bytes::from_static(b"resized"))
        }
    }

    /// Transport with scriptable failures and per-file delays; tracks
    /// the in-flight high-water mark.
    struct MockTransport {
        fail_names: Vec<String>,
        delays: HashMap<String, Duration>,
        default_delay: Duration,
        current: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                fail_names: Vec::new(),
                delays: HashMap::new(),
                default_delay: Duration::from_millis(5),
                current: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn failing(names: &[&str]) -> Self {
            let mut transport = Self::new();
            transport.fail_names = names.iter().map(|n| n.to_string()).collect();
            transport
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn transfer(
            &self,
            file: &ProcessedFile,
            progress: ProgressFn,
        ) -> Result<TransferReceipt, TransferError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = self
                .delays
                .get(&file.original_name)
                .copied()
                .unwrap_or(self.default_delay);
            tokio::time::sleep(delay).await;
            progress(file.size, file.size);

            self.current.fetch_sub(1, Ordering::SeqCst);
            if self.fail_names.contains(&file.original_name) {
                return Err(TransferError::Rejected {
                    status: 500,
                    body: "server error".into(),
                });
            }
            Ok(TransferReceipt {
                location: format!("https://store.example/{}", file.object_key),
                size: file.size,
            })
        }
    }

    fn uploader_with(transport: Arc<MockTransport>, options: UploaderOptions) -> Uploader {
        Uploader::with_parts(
            options,
            ResolvedTarget::direct("https://store.example/upload", Some("tenant".into())),
            transport,
            Arc::new(StubInspector),
            Arc::new(StubResizer),
        )
    }

    fn direct_options() -> UploaderOptions {
        let mut options = UploaderOptions::new(UploadTarget::Direct {
            upload_url: "https://store.example/upload".into(),
            prefix: Some("tenant".into()),
        });
        options.progress_interval = Duration::ZERO;
        options
    }

    fn collect(bus_owner: &Uploader, kind: EventKind) -> Arc<Mutex<Vec<UploadEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus_owner.subscribe(kind, move |event| {
            sink.lock().unwrap().push(event.clone());
        });
        seen
    }

    #[tokio::test]
    async fn three_file_session_reconciles() {
        let transport = Arc::new(MockTransport::failing(&["c.mp4"]));
        let mut uploader = uploader_with(Arc::clone(&transport), direct_options());

        // A: valid image; B: oversized image; C: video the server rejects.
        uploader.add_file(SourceFile::new("a.png", "image/png", vec![1u8; 500_000]));
        uploader.add_file(SourceFile::new("b.jpg", "image/jpeg", vec![1u8; 8_000_000]));
        uploader.add_file(SourceFile::new("c.mp4", "video/mp4", vec![1u8; 1_000]));

        let done_events = collect(&uploader, EventKind::Done);
        let summary = uploader.start().await;

        assert_eq!(summary.uploaded, 1);
        assert_eq!(summary.uploaded_files.len(), 1);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].name, "b.jpg");
        assert_eq!(summary.skipped[0].message, "file size too large");
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].name, "c.mp4");
        assert!(summary.failed[0].message.contains("server error"));

        let done = done_events.lock().unwrap();
        assert_eq!(done.len(), 1, "Done must fire exactly once");
        let UploadEvent::Done(ref payload) = done[0] else {
            panic!("expected Done");
        };
        assert_eq!(payload.uploaded, 1);
    }

    #[tokio::test]
    async fn concurrency_ceiling_is_respected() {
        let transport = Arc::new(MockTransport::new());
        let mut options = direct_options();
        options.concurrency = Some(2);
        let mut uploader = uploader_with(Arc::clone(&transport), options);

        for i in 0..5 {
            uploader.add_file(SourceFile::new(
                format!("f{i}.png"),
                "image/png",
                vec![1u8; 1_000],
            ));
        }

        let summary = uploader.start().await;
        assert_eq!(summary.uploaded, 5);
        assert!(
            transport.max_in_flight.load(Ordering::SeqCst) <= 2,
            "in-flight transfers exceeded the ceiling"
        );
    }

    #[tokio::test]
    async fn uploaded_list_is_in_completion_order() {
        let mut transport = MockTransport::new();
        transport
            .delays
            .insert("slow.png".into(), Duration::from_millis(100));
        transport
            .delays
            .insert("fast.png".into(), Duration::from_millis(5));
        let transport = Arc::new(transport);

        let mut options = direct_options();
        options.concurrency = Some(2);
        let mut uploader = uploader_with(Arc::clone(&transport), options);
        uploader.add_file(SourceFile::new("slow.png", "image/png", vec![1u8; 100]));
        uploader.add_file(SourceFile::new("fast.png", "image/png", vec![1u8; 100]));

        let summary = uploader.start().await;
        assert_eq!(summary.uploaded, 2);
        assert!(summary.uploaded_files[0].location.contains("fast"));
        assert!(summary.uploaded_files[1].location.contains("slow"));
    }

    #[tokio::test]
    async fn progress_is_monotone_and_bounded() {
        let transport = Arc::new(MockTransport::new());
        let mut uploader = uploader_with(Arc::clone(&transport), direct_options());
        for i in 0..3 {
            uploader.add_file(SourceFile::new(
                format!("f{i}.png"),
                "image/png",
                vec![1u8; 1_000],
            ));
        }

        let progress_events = collect(&uploader, EventKind::Progress);
        uploader.start().await;

        let percents: Vec<u8> = progress_events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                UploadEvent::Progress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        assert!(!percents.is_empty());
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert!(percents.iter().all(|p| *p <= 100));
    }

    #[tokio::test]
    async fn empty_session_fires_done_once() {
        let transport = Arc::new(MockTransport::new());
        let mut uploader = uploader_with(transport, direct_options());

        let done_events = collect(&uploader, EventKind::Done);
        let summary = uploader.start().await;

        assert_eq!(summary.uploaded, 0);
        assert!(summary.skipped.is_empty());
        assert!(summary.failed.is_empty());
        assert_eq!(done_events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn processed_events_preserve_input_order() {
        let transport = Arc::new(MockTransport::new());
        let mut uploader = uploader_with(transport, direct_options());
        uploader.add_file(SourceFile::new("a.png", "image/png", vec![1u8; 10]));
        uploader.add_file(SourceFile::new("b.pdf", "application/pdf", vec![1u8; 10]));
        uploader.add_file(SourceFile::new("c.png", "image/png", vec![1u8; 10]));

        let processed_events = collect(&uploader, EventKind::Processed);
        uploader.start().await;

        let events = processed_events.lock().unwrap();
        assert_eq!(events.len(), 3);
        for (i, event) in events.iter().enumerate() {
            let UploadEvent::Processed {
                file,
                processed,
                total,
            } = event
            else {
                panic!("expected Processed");
            };
            assert_eq!(*processed, i);
            assert_eq!(*total, 3);
            // The unsupported PDF never enters the pack.
            assert_eq!(file.is_some(), i != 1);
        }
    }

    #[tokio::test]
    async fn wedged_transfer_times_out_as_failure() {
        let mut transport = MockTransport::new();
        transport
            .delays
            .insert("stuck.png".into(), Duration::from_secs(3600));
        let transport = Arc::new(transport);

        let mut options = direct_options();
        options.transfer_timeout = Duration::from_millis(50);
        let mut uploader = uploader_with(transport, options);
        uploader.add_file(SourceFile::new("stuck.png", "image/png", vec![1u8; 10]));

        let failed_events = collect(&uploader, EventKind::Failed);
        let summary = uploader.start().await;

        assert_eq!(summary.failed.len(), 1);
        assert!(summary.failed[0].message.contains("timed out"));
        assert_eq!(failed_events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancellation_reconciles_totals() {
        let mut transport = MockTransport::new();
        transport.default_delay = Duration::from_secs(3600);
        let transport = Arc::new(transport);

        let mut options = direct_options();
        options.concurrency = Some(1);
        let mut uploader = uploader_with(transport, options);
        for i in 0..3 {
            uploader.add_file(SourceFile::new(
                format!("f{i}.png"),
                "image/png",
                vec![1u8; 10],
            ));
        }

        let cancel = uploader.cancel_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let done_events = collect(&uploader, EventKind::Done);
        let summary = uploader.start().await;

        assert_eq!(summary.failed.len(), 3);
        assert!(
            summary
                .failed
                .iter()
                .all(|f| f.message.contains("cancelled"))
        );
        assert_eq!(done_events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn init_rejects_empty_direct_url() {
        let options = UploaderOptions::new(UploadTarget::Direct {
            upload_url: String::new(),
            prefix: None,
        });
        let result = Uploader::init(options).await;
        assert!(matches!(result, Err(UploadError::MissingUploadUrl)));
    }

    #[tokio::test]
    async fn init_rejects_empty_credentials_endpoint() {
        let options = UploaderOptions::new(UploadTarget::SignedForm {
            credentials_endpoint: String::new(),
        });
        let result = Uploader::init(options).await;
        assert!(matches!(
            result,
            Err(UploadError::MissingCredentialsEndpoint)
        ));
    }

    #[tokio::test]
    async fn object_keys_carry_the_tenant_prefix() {
        let transport = Arc::new(MockTransport::new());
        let mut uploader = uploader_with(Arc::clone(&transport), direct_options());
        uploader.add_file(SourceFile::new("pic one.png", "image/png", vec![1u8; 10]));

        let summary = uploader.start().await;
        assert_eq!(summary.uploaded, 1);
        let location = &summary.uploaded_files[0].location;
        assert!(location.contains("/tenant/"), "got {location}");
        assert!(location.ends_with("_pic-one.png"), "got {location}");
    }
}
