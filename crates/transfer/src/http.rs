//! HTTP multipart transport for object-storage form uploads.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use medialift_protocol::ProcessedFile;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::TransferError;
use crate::form::ResolvedTarget;
use crate::transport::{ProgressFn, TransferReceipt, Transport};

/// Chunk size for the streaming file part; each chunk fires the
/// progress callback once.
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Posts files as multipart forms, POST-policy style: fixed fields,
/// optional signed inputs, then the payload. Success is a `201` whose
/// XML body names the stored object's location.
pub struct HttpTransport {
    client: reqwest::Client,
    target: ResolvedTarget,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, target: ResolvedTarget) -> Self {
        Self { client, target }
    }

    fn file_part(&self, file: &ProcessedFile, progress: ProgressFn) -> Result<Part, TransferError> {
        let total = file.size;
        let mut sent: u64 = 0;
        let chunks = chunk_bytes(&file.data);
        let body = reqwest::Body::wrap_stream(stream::iter(chunks.into_iter().map(
            move |chunk| {
                sent += chunk.len() as u64;
                progress(sent, total);
                Ok::<Bytes, std::io::Error>(chunk)
            },
        )));

        let part = Part::stream_with_length(body, total)
            .file_name(file.original_name.clone())
            .mime_str(&file.mime_type)?;
        Ok(part)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn transfer(
        &self,
        file: &ProcessedFile,
        progress: ProgressFn,
    ) -> Result<TransferReceipt, TransferError> {
        let mut form = Form::new()
            .text("key", file.object_key.clone())
            .text("Content-Type", file.mime_type.clone())
            .text("acl", "public-read")
            .text("success_action_status", "201");

        if let Some(inputs) = &self.target.form_inputs {
            form = form
                .text("policy", inputs.policy.clone())
                .text("X-amz-credential", inputs.credential.clone())
                .text("X-amz-algorithm", inputs.algorithm.clone())
                .text("X-amz-date", inputs.date.clone())
                .text("X-amz-signature", inputs.signature.clone())
                .text("Expires", inputs.expires.clone())
                .text("CacheControl", inputs.cache_control.clone());
        }
        form = form.part("file", self.file_part(file, progress)?);

        let response = self
            .client
            .post(&self.target.post_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        if status != 201 {
            return Err(TransferError::Rejected { status, body });
        }

        let location = extract_location(&body).ok_or(TransferError::MissingLocation)?;
        debug!(key = %file.object_key, location = %location, "transfer complete");
        Ok(TransferReceipt {
            location,
            size: file.size,
        })
    }
}

/// Pulls the `<Location>` element out of a `201` XML body and restores
/// encoded slashes.
fn extract_location(body: &str) -> Option<String> {
    let start = body.find("<Location>")? + "<Location>".len();
    let end = body[start..].find("</Location>")? + start;
    Some(body[start..end].replace("%2F", "/"))
}

/// Splits a payload into fixed-size chunks without copying.
fn chunk_bytes(data: &Bytes) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(data.len().div_ceil(STREAM_CHUNK_SIZE).max(1));
    let mut offset = 0;
    while offset < data.len() {
        let end = (offset + STREAM_CHUNK_SIZE).min(data.len());
        chunks.push(data.slice(offset..end));
        offset = end;
    }
    chunks
}
