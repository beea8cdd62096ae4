//! Editing session: owns the current source image and segmentation mask and
//! drives the `NoImage -> ImageLoaded -> Detecting -> MaskReady` state
//! machine. Pipeline stages are functions of (session state, parameters);
//! nothing here touches a UI toolkit.

use image::{GrayImage, RgbaImage};

use crate::composite;
use crate::content::ContentConfig;
use crate::decode;
use crate::error::{PortraitError, PortraitResult};
use crate::segmentation::{DetectOptions, SegmentationProvider};
use crate::style::StyleParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    NoImage,
    ImageLoaded,
    Detecting,
    MaskReady,
}

/// Handed out by [`Session::begin_detect`]; a result is only applied if the
/// source image has not been replaced since the ticket was issued.
#[derive(Clone, Copy, Debug)]
pub struct DetectTicket {
    generation: u64,
}

pub struct Session {
    state: SessionState,
    source_bytes: Option<Vec<u8>>,
    source: Option<RgbaImage>,
    mask: Option<GrayImage>,
    style: StyleParams,
    text: String,
    /// Last-known-good composited background for display.
    preview: Option<RgbaImage>,
    /// Committed background reference; the export re-decodes these bytes
    /// instead of reusing a live bitmap.
    background_png: Option<Vec<u8>>,
    generation: u64,
    export_in_flight: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::NoImage,
            source_bytes: None,
            source: None,
            mask: None,
            style: StyleParams::default(),
            text: String::new(),
            preview: None,
            background_png: None,
            generation: 0,
            export_in_flight: false,
        }
    }

    /// Seed text from externally supplied default content; the image
    /// reference is the shell's to resolve and load.
    pub fn with_content(content: &ContentConfig) -> Self {
        let mut session = Self::new();
        if let Some(text) = &content.default_text {
            session.text = text.clone();
        }
        session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn style(&self) -> &StyleParams {
        &self.style
    }

    pub fn set_style(&mut self, style: StyleParams) -> PortraitResult<()> {
        style.validate()?;
        self.style = style;
        self.refresh_background();
        Ok(())
    }

    pub fn set_dimness(&mut self, dimness: f32) -> PortraitResult<()> {
        if !dimness.is_finite() || !(0.0..=1.0).contains(&dimness) {
            return Err(PortraitError::validation("dimness must be in [0, 1]"));
        }
        self.style.dimness = dimness;
        self.refresh_background();
        Ok(())
    }

    /// The dimming control is only live once a mask has been computed.
    pub fn dimming_enabled(&self) -> bool {
        self.state == SessionState::MaskReady
    }

    pub fn mask(&self) -> Option<&GrayImage> {
        self.mask.as_ref()
    }

    pub fn preview(&self) -> Option<&RgbaImage> {
        self.preview.as_ref()
    }

    pub fn background_png(&self) -> Option<&[u8]> {
        self.background_png.as_deref()
    }

    /// Load a new source image. Succeeding from any state returns the
    /// session to `ImageLoaded` with the mask invalidated; a decode failure
    /// aborts the operation and retains prior state.
    pub fn load_image(&mut self, bytes: Vec<u8>) -> PortraitResult<()> {
        let decoded = decode::decode_image(&bytes)?;
        tracing::debug!(width = decoded.width(), height = decoded.height(), "image loaded");

        self.source = Some(decoded);
        self.source_bytes = Some(bytes);
        self.mask = None;
        self.state = SessionState::ImageLoaded;
        self.generation += 1;
        self.refresh_background();
        Ok(())
    }

    pub fn begin_detect(&mut self) -> PortraitResult<DetectTicket> {
        match self.state {
            SessionState::NoImage => Err(PortraitError::detection("no image loaded")),
            SessionState::Detecting => {
                Err(PortraitError::detection("a detection is already in progress"))
            }
            SessionState::ImageLoaded | SessionState::MaskReady => {
                self.state = SessionState::Detecting;
                Ok(DetectTicket {
                    generation: self.generation,
                })
            }
        }
    }

    /// Apply (or discard) a detection result. Results for a replaced source
    /// image are dropped; a failed detection returns the session to
    /// `ImageLoaded` so a retry can be issued.
    pub fn complete_detect(
        &mut self,
        ticket: DetectTicket,
        result: PortraitResult<GrayImage>,
    ) -> PortraitResult<()> {
        if ticket.generation != self.generation {
            tracing::warn!("discarding stale detection result for a replaced image");
            return Ok(());
        }

        match result {
            Ok(mask) => {
                let source = self
                    .source
                    .as_ref()
                    .ok_or_else(|| PortraitError::detection("no source image for result"))?;
                if mask.dimensions() != source.dimensions() {
                    self.state = SessionState::ImageLoaded;
                    return Err(PortraitError::detection(format!(
                        "provider mask {}x{} does not match source {}x{}",
                        mask.width(),
                        mask.height(),
                        source.width(),
                        source.height()
                    )));
                }
                self.mask = Some(mask);
                self.state = SessionState::MaskReady;
                self.refresh_background();
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::ImageLoaded;
                Err(e)
            }
        }
    }

    /// Run one sequential detection round trip against a provider.
    pub fn detect(
        &mut self,
        provider: &mut dyn SegmentationProvider,
        opts: &DetectOptions,
    ) -> PortraitResult<()> {
        let ticket = self.begin_detect()?;
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| PortraitError::detection("no image loaded"))?;
        let result = provider.segment(source, opts);
        self.complete_detect(ticket, result)
    }

    /// Discard the mask and restore the undimmed original.
    pub fn reset_mask(&mut self) -> PortraitResult<()> {
        if self.state != SessionState::MaskReady {
            return Err(PortraitError::validation("reset requires a computed mask"));
        }
        self.mask = None;
        self.state = SessionState::ImageLoaded;
        self.refresh_background();
        Ok(())
    }

    pub(crate) fn try_begin_export(&mut self) -> bool {
        if self.export_in_flight {
            return false;
        }
        self.export_in_flight = true;
        true
    }

    pub(crate) fn end_export(&mut self) {
        self.export_in_flight = false;
    }

    #[cfg(test)]
    pub(crate) fn export_in_flight(&self) -> bool {
        self.export_in_flight
    }

    /// Recompute and commit the background. Compositing or encode trouble is
    /// a soft failure: log a warning and leave the last-known-good preview
    /// in place.
    fn refresh_background(&mut self) {
        let Some(source) = &self.source else {
            return;
        };

        let composited = match (&self.mask, self.state) {
            (Some(mask), SessionState::MaskReady) => {
                match composite::dim_background(source, mask, self.style.dimness) {
                    Ok(img) => img,
                    Err(e) => {
                        tracing::warn!(error = %e, "background compositing unavailable, keeping previous preview");
                        return;
                    }
                }
            }
            _ => source.clone(),
        };

        match decode::encode_png(&composited) {
            Ok(png) => {
                self.background_png = Some(png);
                self.preview = Some(composited);
            }
            Err(e) => {
                tracing::warn!(error = %e, "background commit failed, keeping previous preview");
            }
        }
    }
}
