use crate::error::{PortraitError, PortraitResult};
use crate::filter::FilterChain;

/// Line height derived from the font size when none is resolved.
pub const LINE_HEIGHT_FACTOR: f32 = 0.65;

/// Style snapshot for one render.
///
/// Exports take this explicit snapshot instead of reading back live styles,
/// sourced once at call time, preserving the what-you-see-is-what-you-export
/// contract without a hidden dependence on a live view tree.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StyleParams {
    pub font_size_px: f32,
    /// CSS-style weight token (100..=900). Glyph selection happens in the
    /// shell when it picks the font file; the snapshot records the token so
    /// identical inputs reproduce identical exports.
    pub font_weight: u16,
    pub letter_spacing_px: f32,
    pub line_height_px: Option<f32>,
    /// Raw filter expression; `None` resolves to the default export filter.
    pub filter: Option<String>,
    /// Background dimming factor in [0, 1].
    pub dimness: f32,
}

impl Default for StyleParams {
    fn default() -> Self {
        Self {
            font_size_px: 16.0,
            font_weight: 400,
            letter_spacing_px: 0.0,
            line_height_px: None,
            filter: None,
            dimness: 0.5,
        }
    }
}

impl StyleParams {
    pub fn validate(&self) -> PortraitResult<()> {
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(PortraitError::validation("font size must be finite and > 0"));
        }
        if !(100..=900).contains(&self.font_weight) {
            return Err(PortraitError::validation("font weight must be in 100..=900"));
        }
        if !self.letter_spacing_px.is_finite() {
            return Err(PortraitError::validation("letter spacing must be finite"));
        }
        if let Some(lh) = self.line_height_px
            && (!lh.is_finite() || lh <= 0.0)
        {
            return Err(PortraitError::validation("line height must be finite and > 0"));
        }
        if !self.dimness.is_finite() || !(0.0..=1.0).contains(&self.dimness) {
            return Err(PortraitError::validation("dimness must be in [0, 1]"));
        }
        Ok(())
    }

    pub fn line_height(&self) -> f32 {
        self.line_height_px
            .unwrap_or(self.font_size_px * LINE_HEIGHT_FACTOR)
    }

    pub fn resolved_filter(&self) -> PortraitResult<FilterChain> {
        match &self.filter {
            Some(expr) => FilterChain::parse(expr),
            None => Ok(FilterChain::default_export()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterFn;

    #[test]
    fn line_height_falls_back_to_font_size_factor() {
        let style = StyleParams {
            font_size_px: 20.0,
            line_height_px: None,
            ..StyleParams::default()
        };
        assert_eq!(style.line_height(), 13.0);

        let explicit = StyleParams {
            line_height_px: Some(24.0),
            ..style
        };
        assert_eq!(explicit.line_height(), 24.0);
    }

    #[test]
    fn missing_filter_resolves_to_default_export_chain() {
        let style = StyleParams::default();
        let chain = style.resolved_filter().unwrap();
        assert_eq!(chain.fns[0], FilterFn::Grayscale(1.0));
        assert_eq!(chain.fns.len(), 3);
    }

    #[test]
    fn validate_rejects_out_of_range_dimness() {
        let style = StyleParams {
            dimness: 1.5,
            ..StyleParams::default()
        };
        assert!(style.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_font_size() {
        let style = StyleParams {
            font_size_px: 0.0,
            ..StyleParams::default()
        };
        assert!(style.validate().is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        StyleParams::default().validate().unwrap();
    }
}
