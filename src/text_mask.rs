//! Text-mask rasterizer: justified, break-anywhere line fill over a wrapping
//! text stream, rasterized as coverage (white-on-transparent) for
//! `destination-in` clipping at export time.

use image::GrayImage;

use crate::typeface::{GlyphRaster, Typeface};

/// Substituted when the normalized input text is empty.
pub const FALLBACK_TEXT: &str = "text portrait";

/// Working length the wrapping cursor guarantees: indexing wraps modulo the
/// normalized text length, so any target rectangle can be filled without
/// exhausting the stream.
pub const MIN_STREAM_LEN: usize = 100_000;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextSpec {
    pub font_size_px: f32,
    pub letter_spacing_px: f32,
    pub line_height_px: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedGlyph {
    pub ch: char,
    /// Pen x position of the glyph, after justification.
    pub x: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub top_y: f32,
    pub glyphs: Vec<PlacedGlyph>,
}

/// Collapse all whitespace runs to single spaces and trim; an empty result
/// substitutes [`FALLBACK_TEXT`].
pub fn normalize_text(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        FALLBACK_TEXT.to_string()
    } else {
        collapsed
    }
}

struct WrappingCursor {
    chars: Vec<char>,
    pos: usize,
}

impl WrappingCursor {
    fn new(normalized: &str) -> Self {
        Self {
            chars: normalized.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn bump(&mut self) {
        self.pos = (self.pos + 1) % self.chars.len();
    }
}

/// Lay out justified lines from y = 0 while y < `target_h`, advancing by the
/// line height. Each line greedily consumes characters from the wrapping
/// stream until the next one would overflow `target_w`; at least one
/// character is always placed. Justification slack is distributed only after
/// space characters: `extra = (target_w - natural) / space_count`.
pub fn layout(
    face: &dyn Typeface,
    normalized: &str,
    spec: &TextSpec,
    target_w: f32,
    target_h: f32,
) -> Vec<Line> {
    if normalized.is_empty()
        || target_w <= 0.0
        || target_h <= 0.0
        || spec.line_height_px <= 0.0
    {
        return Vec::new();
    }

    let mut cursor = WrappingCursor::new(normalized);
    let mut lines = Vec::new();
    let mut y = 0.0f32;

    while y < target_h {
        let mut run: Vec<(char, f32)> = Vec::new();
        let mut natural = 0.0f32;
        loop {
            let ch = cursor.peek();
            let adv = (face.advance(ch, spec.font_size_px) + spec.letter_spacing_px).max(0.0);
            if !run.is_empty() && natural + adv > target_w {
                break;
            }
            cursor.bump();
            run.push((ch, adv));
            natural += adv;
            // Zero-advance glyphs must not stall the line fill.
            if run.len() >= MIN_STREAM_LEN {
                break;
            }
        }

        let space_count = run.iter().filter(|(ch, _)| *ch == ' ').count();
        let extra = if space_count > 0 {
            (target_w - natural) / space_count as f32
        } else {
            0.0
        };

        let mut pen = 0.0f32;
        let mut glyphs = Vec::with_capacity(run.len());
        for (ch, adv) in run {
            glyphs.push(PlacedGlyph { ch, x: pen });
            pen += adv;
            if ch == ' ' {
                pen += extra;
            }
        }

        lines.push(Line { top_y: y, glyphs });
        y += spec.line_height_px;
    }

    lines
}

/// Rasterize the normalized text into a `width` x `height` coverage mask.
/// Degenerate targets yield a valid blank mask; there are no error paths.
pub fn rasterize_text_mask(
    face: &dyn Typeface,
    raw_text: &str,
    spec: &TextSpec,
    width: u32,
    height: u32,
) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    let normalized = normalize_text(raw_text);
    let lines = layout(face, &normalized, spec, width as f32, height as f32);
    let ascent = face.ascent(spec.font_size_px);

    for line in &lines {
        let baseline_y = line.top_y + ascent;
        for glyph in &line.glyphs {
            if glyph.ch == ' ' {
                continue;
            }
            let raster = face.rasterize(glyph.ch, spec.font_size_px);
            blit_coverage(&mut mask, &raster, glyph.x, baseline_y);
        }
    }

    mask
}

fn blit_coverage(mask: &mut GrayImage, glyph: &GlyphRaster, pen_x: f32, baseline_y: f32) {
    let origin_x = (pen_x + glyph.left as f32).round() as i64;
    let origin_y = (baseline_y - glyph.top as f32).round() as i64;
    let (w, h) = (i64::from(mask.width()), i64::from(mask.height()));

    for row in 0..glyph.height as i64 {
        let y = origin_y + row;
        if y < 0 || y >= h {
            continue;
        }
        for col in 0..glyph.width as i64 {
            let x = origin_x + col;
            if x < 0 || x >= w {
                continue;
            }
            let cov = glyph.coverage[row as usize * glyph.width + col as usize];
            if cov == 0 {
                continue;
            }
            let px = mask.get_pixel_mut(x as u32, y as u32);
            px.0[0] = px.0[0].max(cov);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed-advance face: every glyph is `advance` wide, spaces are blank,
    /// everything else rasterizes as a full block.
    struct FixedFace {
        advance: f32,
    }

    impl Typeface for FixedFace {
        fn advance(&self, _ch: char, _px: f32) -> f32 {
            self.advance
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
            let w = self.advance.max(1.0) as usize;
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

    fn spec(font_size: f32, spacing: f32, line_height: f32) -> TextSpec {
        TextSpec {
            font_size_px: font_size,
            letter_spacing_px: spacing,
            line_height_px: line_height,
        }
    }

    #[test]
    fn normalize_collapses_whitespace_and_trims() {
        assert_eq!(normalize_text("  hello\n\t world  "), "hello world");
        assert_eq!(normalize_text("a  b"), "a b");
    }

    #[test]
    fn normalize_empty_substitutes_fallback() {
        assert_eq!(normalize_text(""), FALLBACK_TEXT);
        assert_eq!(normalize_text(" \n\t "), FALLBACK_TEXT);
    }

    #[test]
    fn every_line_places_at_least_one_glyph() {
        let face = FixedFace { advance: 50.0 };
        // Target narrower than a single glyph.
        let lines = layout(&face, "abc", &spec(10.0, 0.0, 10.0), 30.0, 40.0);
        assert_eq!(lines.len(), 4);
        for line in &lines {
            assert_eq!(line.glyphs.len(), 1);
        }
    }

    #[test]
    fn line_count_follows_line_height() {
        let face = FixedFace { advance: 5.0 };
        let lines = layout(&face, "abcdef", &spec(10.0, 0.0, 12.0), 100.0, 40.0);
        // y = 0, 12, 24, 36 are all < 40.
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].top_y, 12.0);
    }

    #[test]
    fn justification_fills_target_width_exactly() {
        let face = FixedFace { advance: 9.0 };
        let sp = spec(10.0, 1.0, 10.0);
        let lines = layout(&face, "ab cd ef", &sp, 97.0, 10.0);
        assert_eq!(lines.len(), 1);

        let line = &lines[0];
        let natural = 10.0 * line.glyphs.len() as f32;
        let spaces = line.glyphs.iter().filter(|g| g.ch == ' ').count();
        assert!(spaces > 0);

        let extra = (97.0 - natural) / spaces as f32;
        assert!((natural + spaces as f32 * extra - 97.0).abs() < 1e-3);

        // The glyph after a space starts one advance plus the slack later.
        let space_idx = line.glyphs.iter().position(|g| g.ch == ' ').unwrap();
        let gap = line.glyphs[space_idx + 1].x - line.glyphs[space_idx].x;
        assert!((gap - (10.0 + extra)).abs() < 1e-3);
    }

    #[test]
    fn no_spaces_means_no_justification_slack() {
        let face = FixedFace { advance: 10.0 };
        let lines = layout(&face, "abcdefgh", &spec(10.0, 0.0, 10.0), 45.0, 10.0);
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.glyphs.len(), 4);
        for (i, g) in line.glyphs.iter().enumerate() {
            assert_eq!(g.x, 10.0 * i as f32);
        }
    }

    #[test]
    fn stream_wraps_cyclically_without_gaps() {
        let face = FixedFace { advance: 10.0 };
        let normalized = normalize_text("hi yo");
        let lines = layout(&face, &normalized, &spec(10.0, 0.0, 10.0), 40.0, 50.0);

        let drawn: Vec<char> = lines.iter().flat_map(|l| l.glyphs.iter().map(|g| g.ch)).collect();
        let source: Vec<char> = normalized.chars().collect();
        assert!(drawn.len() > source.len());
        for (i, ch) in drawn.iter().enumerate() {
            assert_eq!(*ch, source[i % source.len()], "mismatch at stream index {i}");
        }
    }

    #[test]
    fn degenerate_targets_yield_no_lines() {
        let face = FixedFace { advance: 10.0 };
        assert!(layout(&face, "abc", &spec(10.0, 0.0, 10.0), 0.0, 100.0).is_empty());
        assert!(layout(&face, "abc", &spec(10.0, 0.0, 10.0), 100.0, 0.0).is_empty());
    }

    #[test]
    fn rasterize_blank_for_degenerate_target() {
        let face = FixedFace { advance: 10.0 };
        let mask = rasterize_text_mask(&face, "abc", &spec(10.0, 0.0, 10.0), 0, 64);
        assert_eq!(mask.dimensions(), (0, 64));
    }

    #[test]
    fn rasterize_covers_glyph_cells_and_skips_spaces() {
        let face = FixedFace { advance: 8.0 };
        let mask = rasterize_text_mask(&face, "a b", &spec(8.0, 0.0, 10.0), 24, 10);
        assert!(mask.pixels().any(|p| p.0[0] == 255));

        // Column inside the first glyph is covered; the space gap after it
        // stays transparent.
        assert_eq!(mask.get_pixel(2, 3).0[0], 255);
        assert_eq!(mask.get_pixel(10, 3).0[0], 0);
    }
}
