//! Image crop operations.

use std::sync::Arc;

use image::GenericImageView;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET;
use crate::backend::MediaBackend;
use crate::error::{MediaError, MediaResult};
use crate::job::MediaOperation;
use crate::poll::{PollOutcome, PollSettings, await_job};

/// Crop region as canvas percentages.
///
/// Values are nominally 0–100 but arrive unclamped from the caller; the
/// clamping happens in [`crop_box`] against the real pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRegion {
    /// Left edge as a percentage of the image width.
    pub x_percent: f64,
    /// Top edge as a percentage of the image height.
    pub y_percent: f64,
    /// Box width as a percentage of the image width.
    pub width_percent: f64,
    /// Box height as a percentage of the image height.
    pub height_percent: f64,
}

/// Absolute pixel crop box, clamped to the image bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Box width in pixels, at least 1.
    pub width: u32,
    /// Box height in pixels, at least 1.
    pub height: u32,
}

/// Scales a percentage region to pixel coordinates and clamps it to the
/// image bounds.
///
/// Offsets floor into `[0, dimension]`; width and height floor into
/// `[1, dimension - offset]` with the lower bound winning, so the crop
/// never degenerates to a zero-area box even for out-of-range input.
pub fn crop_box(region: CropRegion, width: u32, height: u32) -> CropBox {
    let x = ((region.x_percent / 100.0) * width as f64).floor() as i64;
    let y = ((region.y_percent / 100.0) * height as f64).floor() as i64;
    let w = ((region.width_percent / 100.0) * width as f64).floor() as i64;
    let h = ((region.height_percent / 100.0) * height as f64).floor() as i64;

    let crop_x = x.clamp(0, width as i64);
    let crop_y = y.clamp(0, height as i64);
    let crop_w = w.min(width as i64 - crop_x).max(1);
    let crop_h = h.min(height as i64 - crop_y).max(1);

    CropBox {
        x: crop_x as u32,
        y: crop_y as u32,
        width: crop_w as u32,
        height: crop_h as u32,
    }
}

/// Result of a crop operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropOutput {
    /// URL of the cropped asset.
    pub image_url: String,
    /// Crop box width in pixels.
    pub width: u32,
    /// Crop box height in pixels.
    pub height: u32,
}

/// Image processing service backed by a media backend.
#[derive(Clone)]
pub struct ImageService {
    backend: Arc<dyn MediaBackend>,
    poll: PollSettings,
}

impl ImageService {
    /// Creates a new service with default poll pacing.
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            poll: PollSettings::default(),
        }
    }

    /// Sets the job polling pace.
    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Crops the image at `source_url` to the given percentage region.
    ///
    /// The source is fetched and decoded locally to learn its true pixel
    /// dimensions before the clamped absolute-pixel crop is submitted to
    /// the processing backend.
    pub async fn crop(&self, source_url: &str, region: CropRegion) -> MediaResult<CropOutput> {
        let bytes = self.backend.fetch(source_url).await?;
        let decoded =
            image::load_from_memory(&bytes).map_err(|e| MediaError::Decode(e.to_string()))?;
        let (width, height) = decoded.dimensions();
        let cropped = crop_box(region, width, height);

        tracing::debug!(
            target: TRACING_TARGET,
            source_url,
            width,
            height,
            crop_x = cropped.x,
            crop_y = cropped.y,
            crop_w = cropped.width,
            crop_h = cropped.height,
            "Submitting crop"
        );

        let operation = MediaOperation::Crop {
            source_url: source_url.to_string(),
            x: cropped.x,
            y: cropped.y,
            width: cropped.width,
            height: cropped.height,
        };
        let handle = self.backend.submit(&operation).await?;

        match await_job(self.backend.as_ref(), &handle, self.poll).await {
            PollOutcome::Completed(result_url) => Ok(CropOutput {
                image_url: result_url,
                width: cropped.width,
                height: cropped.height,
            }),
            PollOutcome::Failed(reason) => Err(MediaError::Job { reason }),
            PollOutcome::TimedOut => Err(MediaError::JobTimeout),
        }
    }
}
