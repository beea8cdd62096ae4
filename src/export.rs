//! Export renderer: snapshot style, rasterize the text mask at device
//! resolution, re-decode the committed background, cover-fit, filter, clip
//! through the mask, flatten onto black, and encode a PNG.

use crate::composite;
use crate::decode;
use crate::error::{PortraitError, PortraitResult};
use crate::session::Session;
use crate::text_mask::{self, TextSpec};
use crate::typeface::Typeface;

pub const EXPORT_FILENAME: &str = "text-portrait.png";

/// Device pixels per nominal pixel in the export raster.
pub const EXPORT_SCALE: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenderTarget {
    pub width_px: u32,
    pub height_px: u32,
    pub scale_factor: u32,
}

impl RenderTarget {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px,
            height_px,
            scale_factor: EXPORT_SCALE,
        }
    }

    /// Saturates instead of panicking; [`validate`](Self::validate) rejects
    /// targets whose device size does not fit in `u32`.
    pub fn device_width(&self) -> u32 {
        self.width_px.saturating_mul(self.scale_factor)
    }

    pub fn device_height(&self) -> u32 {
        self.height_px.saturating_mul(self.scale_factor)
    }

    pub fn validate(&self) -> PortraitResult<()> {
        if self.width_px == 0 || self.height_px == 0 || self.scale_factor == 0 {
            return Err(PortraitError::validation(
                "render target dimensions and scale must be > 0",
            ));
        }
        if self.width_px.checked_mul(self.scale_factor).is_none()
            || self.height_px.checked_mul(self.scale_factor).is_none()
        {
            return Err(PortraitError::validation(
                "render target device size overflows u32",
            ));
        }
        Ok(())
    }
}

pub struct ExportOutput {
    pub filename: &'static str,
    pub png: Vec<u8>,
}

/// Outcome of one export click. Failures never escape as panics or errors;
/// they are folded into the status message with the trigger re-enabled.
pub struct ExportReport {
    pub status: String,
    pub output: Option<ExportOutput>,
}

impl ExportReport {
    pub fn succeeded(&self) -> bool {
        self.output.is_some()
    }
}

/// Run one export against the session's committed background and current
/// style/text. Only one export may be in flight at a time; the guard is
/// released on both success and failure paths.
pub fn export(session: &mut Session, face: &dyn Typeface, target: &RenderTarget) -> ExportReport {
    if !session.try_begin_export() {
        return ExportReport {
            status: "export already in progress".to_string(),
            output: None,
        };
    }

    let result = render_export(session, face, target);
    session.end_export();

    match result {
        Ok(png) => ExportReport {
            status: format!("saved {EXPORT_FILENAME}"),
            output: Some(ExportOutput {
                filename: EXPORT_FILENAME,
                png,
            }),
        },
        Err(e) => {
            tracing::warn!(error = %e, "export failed");
            ExportReport {
                status: format!("export failed: {e}"),
                output: None,
            }
        }
    }
}

fn render_export(
    session: &Session,
    face: &dyn Typeface,
    target: &RenderTarget,
) -> PortraitResult<Vec<u8>> {
    target.validate()?;
    let style = session.style().clone();
    style.validate()?;
    let filter = style.resolved_filter()?;

    let (dw, dh) = (target.device_width(), target.device_height());
    let scale = target.scale_factor as f32;
    let spec = TextSpec {
        font_size_px: style.font_size_px * scale,
        letter_spacing_px: style.letter_spacing_px * scale,
        line_height_px: style.line_height() * scale,
    };
    let mask = text_mask::rasterize_text_mask(face, session.text(), &spec, dw, dh);

    // Explicit reload of the committed background, never a cached bitmap.
    let bytes = session
        .background_png()
        .ok_or_else(|| PortraitError::load("no background committed (load an image first)"))?;
    let background = decode::decode_image(bytes)?;

    let (sx, sy, sw, sh) = cover_crop(background.width(), background.height(), dw, dh);
    let cropped = image::imageops::crop_imm(&background, sx, sy, sw, sh).to_image();
    let mut scaled = image::imageops::resize(&cropped, dw, dh, image::imageops::FilterType::Triangle);

    filter.apply(&mut scaled);
    composite::mask_in_place(&mut scaled, &mask)?;
    let flat = composite::flatten_onto_black(&scaled);

    decode::encode_png(&flat)
}

/// Source crop rectangle for cover fit: preserve the target aspect ratio by
/// center-cropping exactly one axis, never both.
pub fn cover_crop(img_w: u32, img_h: u32, target_w: u32, target_h: u32) -> (u32, u32, u32, u32) {
    let target_ratio = f64::from(target_w) / f64::from(target_h);
    let img_ratio = f64::from(img_w) / f64::from(img_h);

    if img_ratio > target_ratio {
        let sw = ((f64::from(img_h) * target_ratio).round() as u32).clamp(1, img_w);
        ((img_w - sw) / 2, 0, sw, img_h)
    } else {
        let sh = ((f64::from(img_w) / target_ratio).round() as u32).clamp(1, img_h);
        (0, (img_h - sh) / 2, img_w, sh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typeface::GlyphRaster;

    struct BlockFace;

    impl Typeface for BlockFace {
        fn advance(&self, _ch: char, px: f32) -> f32 {
            px * 0.5
        }

        fn ascent(&self, px: f32) -> f32 {
            px * 0.8
        }

        fn rasterize(&self, ch: char, px: f32) -> GlyphRaster {
            if ch == ' ' {
                return GlyphRaster {
                    width: 0,
                    height: 0,
                    left: 0,
                    top: 0,
                    coverage: Vec::new(),
                };
            }
            let w = (px * 0.5).max(1.0) as usize;
            let h = px.max(1.0) as usize;
            GlyphRaster {
                width: w,
                height: h,
                left: 0,
                top: h as i32,
                coverage: vec![255; w * h],
            }
        }
    }

    #[test]
    fn cover_crop_wide_image_crops_width_centered() {
        let (sx, sy, sw, sh) = cover_crop(200, 100, 100, 100);
        assert_eq!((sx, sy, sw, sh), (50, 0, 100, 100));
    }

    #[test]
    fn cover_crop_tall_image_crops_height_centered() {
        let (sx, sy, sw, sh) = cover_crop(100, 300, 100, 100);
        assert_eq!((sx, sy, sw, sh), (0, 100, 100, 100));
    }

    #[test]
    fn cover_crop_matching_ratio_crops_nothing() {
        let (sx, sy, sw, sh) = cover_crop(200, 100, 100, 50);
        assert_eq!((sx, sy, sw, sh), (0, 0, 200, 100));
    }

    #[test]
    fn cover_crop_never_crops_both_axes() {
        for (iw, ih, tw, th) in [(640, 480, 100, 100), (480, 640, 300, 100), (123, 457, 89, 55)] {
            let (sx, sy, sw, sh) = cover_crop(iw, ih, tw, th);
            assert!(sw == iw || sh == ih, "both axes cropped for {iw}x{ih} -> {tw}x{th}");
            if sw < iw {
                assert_eq!(sx, (iw - sw) / 2);
                assert_eq!(sy, 0);
            } else {
                assert_eq!(sy, (ih - sh) / 2);
                assert_eq!(sx, 0);
            }
        }
    }

    #[test]
    fn export_without_image_reports_load_failure() {
        let mut session = Session::new();
        session.set_text("words");
        let report = export(&mut session, &BlockFace, &RenderTarget::new(32, 32));
        assert!(!report.succeeded());
        assert!(report.status.contains("export failed"));
        assert!(!session.export_in_flight());
    }

    #[test]
    fn validate_rejects_device_size_overflow() {
        assert!(RenderTarget::new(u32::MAX, 1).validate().is_err());
        assert!(RenderTarget::new(1, u32::MAX).validate().is_err());
        assert!(RenderTarget::new(540, 675).validate().is_ok());
        // The accessors saturate rather than panic on rejected targets.
        assert_eq!(RenderTarget::new(u32::MAX, 1).device_width(), u32::MAX);
    }

    #[test]
    fn export_rejects_oversized_target() {
        let mut session = Session::new();
        let report = export(&mut session, &BlockFace, &RenderTarget::new(u32::MAX, 32));
        assert!(!report.succeeded());
        assert!(report.status.contains("export failed"));
        assert!(!session.export_in_flight());
    }

    #[test]
    fn export_rejects_degenerate_target() {
        let mut session = Session::new();
        let report = export(&mut session, &BlockFace, &RenderTarget::new(0, 32));
        assert!(!report.succeeded());
        assert!(!session.export_in_flight());
    }

    #[test]
    fn overlapping_export_is_refused() {
        let mut session = Session::new();
        assert!(session.try_begin_export());
        let report = export(&mut session, &BlockFace, &RenderTarget::new(32, 32));
        assert!(!report.succeeded());
        assert!(report.status.contains("in progress"));
        // The refused call must not release the holder's guard.
        assert!(session.export_in_flight());
        session.end_export();
    }
}
