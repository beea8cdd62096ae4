//! Per-pixel compositing primitives for the portrait pipeline.
//!
//! All buffers are straight-alpha RGBA8; masks are 8-bit luminance where
//! 255 means fully foreground / fully covered.

use image::{GrayImage, RgbaImage};

use crate::error::{PortraitError, PortraitResult};

/// Darken the background region of `base` by `dimness`, leaving the mask
/// foreground untouched.
///
/// Equivalent to drawing a black overlay at alpha = dimness, erasing it
/// through the mask (`destination-out`), and compositing the remainder over
/// the base. Per pixel: `out = base * (1 - dimness * (1 - m))`.
pub fn dim_background(
    base: &RgbaImage,
    mask: &GrayImage,
    dimness: f32,
) -> PortraitResult<RgbaImage> {
    if base.dimensions() != mask.dimensions() {
        return Err(PortraitError::validation(format!(
            "mask {}x{} does not match image {}x{}",
            mask.width(),
            mask.height(),
            base.width(),
            base.height()
        )));
    }
    let dimness = dimness.clamp(0.0, 1.0);

    let mut out = base.clone();
    for (px, m) in out.pixels_mut().zip(mask.pixels()) {
        let shade = (dimness * f32::from(255 - m.0[0])).round() as u16;
        let keep = 255 - shade.min(255);
        px.0[0] = mul_div255(u16::from(px.0[0]), keep);
        px.0[1] = mul_div255(u16::from(px.0[1]), keep);
        px.0[2] = mul_div255(u16::from(px.0[2]), keep);
    }
    Ok(out)
}

/// `destination-in`: keep `dst` only where the mask has coverage, scaling
/// alpha proportionally for partial coverage.
pub fn mask_in_place(dst: &mut RgbaImage, mask: &GrayImage) -> PortraitResult<()> {
    if dst.dimensions() != mask.dimensions() {
        return Err(PortraitError::validation(format!(
            "mask {}x{} does not match target {}x{}",
            mask.width(),
            mask.height(),
            dst.width(),
            dst.height()
        )));
    }
    for (px, m) in dst.pixels_mut().zip(mask.pixels()) {
        px.0[3] = mul_div255(u16::from(px.0[3]), u16::from(m.0[0]));
    }
    Ok(())
}

/// Composite straight-alpha pixels over an opaque black backdrop.
pub fn flatten_onto_black(img: &RgbaImage) -> RgbaImage {
    let mut out = img.clone();
    for px in out.pixels_mut() {
        let a = u16::from(px.0[3]);
        px.0[0] = mul_div255(u16::from(px.0[0]), a);
        px.0[1] = mul_div255(u16::from(px.0[1]), a);
        px.0[2] = mul_div255(u16::from(px.0[2]), a);
        px.0[3] = 255;
    }
    out
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
