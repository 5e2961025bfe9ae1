//! Media inspection: natural dimensions and descriptive tags.

use std::io::Cursor;

use async_trait::async_trait;
use exif::{In, Tag, Value};
use medialift_protocol::{MediaInfo, MediaKind};
use tracing::debug;

use crate::PipelineError;

/// Extracts dimensions and descriptive tags from raw media bytes.
///
/// Implementations may call out to external probing services; the
/// shipped [`ExifInspector`] works purely in memory.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    async fn inspect(&self, data: &[u8], kind: MediaKind) -> Result<MediaInfo, PipelineError>;
}

/// In-memory inspector backed by the `image` and EXIF decoders.
///
/// Images get natural dimensions plus whatever descriptive EXIF fields
/// are present; the description resolves through a priority chain of
/// tag sources. Video containers are not parsed here — only the byte
/// size is reported, and callers wanting duration or dimensions plug in
/// their own [`MediaInspector`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifInspector;

#[async_trait]
impl MediaInspector for ExifInspector {
    async fn inspect(&self, data: &[u8], kind: MediaKind) -> Result<MediaInfo, PipelineError> {
        let mut info = MediaInfo {
            size: data.len() as u64,
            ..MediaInfo::default()
        };
        if kind != MediaKind::Image {
            return Ok(info);
        }

        let (width, height) = image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .into_dimensions()?;
        info.width = Some(width);
        info.height = Some(height);

        // Tags are best-effort: a file without an EXIF segment is normal.
        match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
            Ok(exif) => {
                info.description = ascii_text(&exif, Tag::ImageDescription)
                    .or_else(|| user_comment_text(&exif));
            }
            Err(err) => debug!(error = %err, "no EXIF data"),
        }

        Ok(info)
    }
}

/// Returns the trimmed text of an ASCII field, if present and non-empty.
fn ascii_text(exif: &exif::Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Ascii(chunks) = &field.value else {
        return None;
    };
    let text = chunks
        .iter()
        .map(|chunk| String::from_utf8_lossy(chunk))
        .collect::<Vec<_>>()
        .join(" ");
    let text = text.trim().trim_matches('\0').trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Decodes the `UserComment` field, which carries an 8-byte character
/// code prefix before the text.
fn user_comment_text(exif: &exif::Exif) -> Option<String> {
    let field = exif.get_field(Tag::UserComment, In::PRIMARY)?;
    let Value::Undefined(bytes, _) = &field.value else {
        return None;
    };
    if bytes.len() <= 8 {
        return None;
    }
    let text = String::from_utf8_lossy(&bytes[8..]);
    let text = text.trim().trim_matches('\0').trim();
    (!text.is_empty()).then(|| text.to_string())
}
