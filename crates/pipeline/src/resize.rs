//! Resize decision and execution.

use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use image::imageops::FilterType;

use crate::PipelineError;

/// Computes target dimensions fitting `width × height` inside
/// `max_width × max_height` while preserving the aspect ratio.
///
/// Width is clamped first and height rescaled by the *original* ratio
/// (floor); if the result is still too tall, height is clamped and width
/// rescaled (floor). Returns `None` when the input already fits, so the
/// decision is idempotent.
pub fn fit_within(
    width: u32,
    height: u32,
    max_width: u32,
    max_height: u32,
) -> Option<(u32, u32)> {
    if width <= max_width && height <= max_height {
        return None;
    }

    let ratio = width as f64 / height as f64;
    let (mut w, mut h) = (width, height);
    if w > max_width {
        w = max_width;
        h = (w as f64 / ratio).floor() as u32;
    }
    if h > max_height {
        h = max_height;
        w = (h as f64 * ratio).floor() as u32;
    }
    Some((w, h))
}

/// Resamples raw image bytes to the given dimensions.
#[async_trait]
pub trait Resizer: Send + Sync {
    async fn resize(&self, data: &[u8], width: u32, height: u32) -> Result<Bytes, PipelineError>;
}

/// Resizer backed by the `image` crate; output is always JPEG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageResizer;

impl ImageResizer {
    /// Picks a resampling filter from the downscale ratio: heavy
    /// downscales tolerate cheaper filters.
    fn select_filter(orig_w: u32, orig_h: u32, new_w: u32, new_h: u32) -> FilterType {
        let ratio = (orig_w as f32 / new_w as f32).max(orig_h as f32 / new_h as f32);
        if ratio > 2.0 {
            FilterType::Triangle
        } else if ratio > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }
}

#[async_trait]
impl Resizer for ImageResizer {
    async fn resize(&self, data: &[u8], width: u32, height: u32) -> Result<Bytes, PipelineError> {
        let img = image::load_from_memory(data)?;
        let filter = Self::select_filter(img.width(), img.height(), width, height);
        let resized = img.resize_exact(width, height, filter);

        // JPEG has no alpha channel; flatten before encoding.
        let rgb = image::DynamicImage::ImageRgb8(resized.to_rgb8());
        let mut out = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)?;
        Ok(Bytes::from(out))
    }
}
