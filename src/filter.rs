use image::RgbaImage;

use crate::error::{PortraitError, PortraitResult};

/// Filter applied to the exported background if the style resolves none.
pub const DEFAULT_EXPORT_FILTER: &str = "grayscale(1) contrast(1.2) brightness(1.1)";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterFn {
    Grayscale(f32),
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    Invert(f32),
    Sepia(f32),
}

/// An ordered chain of CSS filter functions, e.g. `grayscale(1) contrast(1.2)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterChain {
    pub fns: Vec<FilterFn>,
}

impl FilterChain {
    /// Parse a space-separated chain of `name(value)` terms. Values are plain
    /// numbers or percentages. `none` (or an all-whitespace string) parses as
    /// the empty chain.
    pub fn parse(expr: &str) -> PortraitResult<Self> {
        let expr = expr.trim();
        if expr.is_empty() || expr.eq_ignore_ascii_case("none") {
            return Ok(Self::default());
        }

        let mut fns = Vec::new();
        for term in expr.split_whitespace() {
            fns.push(parse_term(term)?);
        }
        Ok(Self { fns })
    }

    pub fn default_export() -> Self {
        // DEFAULT_EXPORT_FILTER is a crate constant and always parses.
        Self::parse(DEFAULT_EXPORT_FILTER).unwrap_or_default()
    }

    pub fn is_identity(&self) -> bool {
        self.fns.is_empty()
    }

    /// Apply the chain per pixel, straight alpha, alpha channel untouched.
    pub fn apply(&self, img: &mut RgbaImage) {
        if self.is_identity() {
            return;
        }
        for px in img.pixels_mut() {
            let mut rgb = [
                f32::from(px.0[0]) / 255.0,
                f32::from(px.0[1]) / 255.0,
                f32::from(px.0[2]) / 255.0,
            ];
            for f in &self.fns {
                rgb = apply_fn(*f, rgb);
            }
            px.0[0] = to_u8(rgb[0]);
            px.0[1] = to_u8(rgb[1]);
            px.0[2] = to_u8(rgb[2]);
        }
    }
}

fn parse_term(term: &str) -> PortraitResult<FilterFn> {
    let Some(open) = term.find('(') else {
        return Err(PortraitError::validation(format!(
            "filter term '{term}' is not of the form name(value)"
        )));
    };
    let Some(rest) = term[open + 1..].strip_suffix(')') else {
        return Err(PortraitError::validation(format!(
            "filter term '{term}' is missing its closing parenthesis"
        )));
    };

    let name = term[..open].trim().to_ascii_lowercase();
    let amount = parse_amount(rest.trim(), &name)?;

    match name.as_str() {
        "grayscale" => Ok(FilterFn::Grayscale(amount.min(1.0))),
        "brightness" => Ok(FilterFn::Brightness(amount)),
        "contrast" => Ok(FilterFn::Contrast(amount)),
        "saturate" => Ok(FilterFn::Saturate(amount)),
        "invert" => Ok(FilterFn::Invert(amount.min(1.0))),
        "sepia" => Ok(FilterFn::Sepia(amount.min(1.0))),
        _ => Err(PortraitError::validation(format!(
            "unknown filter function '{name}'"
        ))),
    }
}

fn parse_amount(raw: &str, name: &str) -> PortraitResult<f32> {
    let (num, percent) = match raw.strip_suffix('%') {
        Some(n) => (n, true),
        None => (raw, false),
    };
    let value: f32 = num.trim().parse().map_err(|_| {
        PortraitError::validation(format!("filter '{name}' has a non-numeric amount '{raw}'"))
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(PortraitError::validation(format!(
            "filter '{name}' amount must be finite and >= 0"
        )));
    }
    Ok(if percent { value / 100.0 } else { value })
}

fn apply_fn(f: FilterFn, [r, g, b]: [f32; 3]) -> [f32; 3] {
    match f {
        FilterFn::Grayscale(a) => {
            let l = luma(r, g, b);
            [mix(r, l, a), mix(g, l, a), mix(b, l, a)]
        }
        FilterFn::Brightness(a) => [r * a, g * a, b * a],
        FilterFn::Contrast(a) => [
            (r - 0.5) * a + 0.5,
            (g - 0.5) * a + 0.5,
            (b - 0.5) * a + 0.5,
        ],
        FilterFn::Saturate(a) => {
            let l = luma(r, g, b);
            [mix(l, r, a), mix(l, g, a), mix(l, b, a)]
        }
        FilterFn::Invert(a) => [mix(r, 1.0 - r, a), mix(g, 1.0 - g, a), mix(b, 1.0 - b, a)],
        FilterFn::Sepia(a) => {
            let sr = 0.393 * r + 0.769 * g + 0.189 * b;
            let sg = 0.349 * r + 0.686 * g + 0.168 * b;
            let sb = 0.272 * r + 0.534 * g + 0.131 * b;
            [mix(r, sr, a), mix(g, sg, a), mix(b, sb, a)]
        }
    }
}

fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
