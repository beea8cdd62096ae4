use crate::error::{PortraitError, PortraitResult};

/// A rasterized glyph: coverage bitmap plus its placement relative to the pen.
pub struct GlyphRaster {
    pub width: usize,
    pub height: usize,
    /// Horizontal offset from the pen position to the bitmap's left edge.
    pub left: i32,
    /// Vertical offset from the baseline up to the bitmap's top edge.
    pub top: i32,
    /// Row-major coverage, 0 = empty, 255 = full.
    pub coverage: Vec<u8>,
}

/// Glyph measurement and rasterization seam.
///
/// The rasterizer only needs per-character advances, the ascent for
/// top-aligned baselines, and a coverage bitmap per glyph. Production code
/// goes through [`FontdueFace`]; tests substitute fixed-advance fakes.
pub trait Typeface {
    /// Natural advance width of `ch` at `px` pixels, excluding letter spacing.
    fn advance(&self, ch: char, px: f32) -> f32;

    /// Distance from the top of the line box down to the baseline.
    fn ascent(&self, px: f32) -> f32;

    fn rasterize(&self, ch: char, px: f32) -> GlyphRaster;
}

pub struct FontdueFace {
    font: fontdue::Font,
}

impl FontdueFace {
    pub fn from_bytes(bytes: &[u8]) -> PortraitResult<Self> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| PortraitError::load(format!("parse font: {e}")))?;
        Ok(Self { font })
    }
}

impl Typeface for FontdueFace {
    fn advance(&self, ch: char, px: f32) -> f32 {
        self.font.metrics(ch, px).advance_width
    }

    fn ascent(&self, px: f32) -> f32 {
        self.font
            .horizontal_line_metrics(px)
            .map(|m| m.ascent)
            .unwrap_or(px * 0.8)
    }

    fn rasterize(&self, ch: char, px: f32) -> GlyphRaster {
        let (metrics, coverage) = self.font.rasterize(ch, px);
        GlyphRaster {
            width: metrics.width,
            height: metrics.height,
            left: metrics.xmin,
            top: metrics.ymin + metrics.height as i32,
            coverage,
        }
    }
}
