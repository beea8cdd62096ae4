//! Segmentation provider seam.
//!
//! The pipeline consumes the provider as a black box: one image in, one
//! grayscale mask of matching dimensions out, luminance encoding foreground
//! (person) probability.

use std::path::PathBuf;
use std::time::Duration;

use image::{GrayImage, RgbaImage};

use crate::decode;
use crate::error::{PortraitError, PortraitResult};

/// Model fidelity tier knob forwarded to the provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFidelity {
    Fast,
    #[default]
    Balanced,
    Accurate,
}

#[derive(Clone, Debug)]
pub struct DetectOptions {
    pub fidelity: ModelFidelity,
    /// Providers must give up and fail within this budget; a hung external
    /// call surfaces as a detection failure instead of a stuck session.
    pub timeout: Duration,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            fidelity: ModelFidelity::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

pub trait SegmentationProvider {
    fn segment(&mut self, image: &RgbaImage, opts: &DetectOptions) -> PortraitResult<GrayImage>;
}

/// Provider backed by a prepared mask raster on disk, so the full pipeline
/// runs without an inference runtime. The mask is resampled to the source
/// image dimensions when they differ.
pub struct MaskFile {
    path: PathBuf,
}

impl MaskFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SegmentationProvider for MaskFile {
    fn segment(&mut self, image: &RgbaImage, _opts: &DetectOptions) -> PortraitResult<GrayImage> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            PortraitError::detection(format!("read mask '{}': {e}", self.path.display()))
        })?;
        let mask = decode::decode_mask(&bytes)
            .map_err(|e| PortraitError::detection(format!("mask raster: {e}")))?;

        if mask.dimensions() == image.dimensions() {
            return Ok(mask);
        }
        tracing::debug!(
            from = ?mask.dimensions(),
            to = ?image.dimensions(),
            "resampling mask to source dimensions"
        );
        Ok(image::imageops::resize(
            &mask,
            image.width(),
            image.height(),
            image::imageops::FilterType::Triangle,
        ))
    }
}
