use std::io::Cursor;

use image::{GrayImage, RgbaImage};

use crate::error::{PortraitError, PortraitResult};

pub fn decode_image(bytes: &[u8]) -> PortraitResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| PortraitError::load(format!("decode image from memory: {e}")))?;
    Ok(dyn_img.to_rgba8())
}

/// Decode a segmentation mask raster. Luminance encodes foreground probability.
pub fn decode_mask(bytes: &[u8]) -> PortraitResult<GrayImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| PortraitError::load(format!("decode mask from memory: {e}")))?;
    Ok(dyn_img.to_luma8())
}

pub fn encode_png(img: &RgbaImage) -> PortraitResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PortraitError::export(format!("encode png: {e}")))?;
    Ok(buf)
}
