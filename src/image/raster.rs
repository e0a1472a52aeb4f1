//! Raster image handling with the `image` crate.

use image::ImageFormat;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};

use crate::asset::{Outcome, TransformError};

/// Chunks that change how pixel values map to displayed color.
const COLOR_CHUNKS: [&[u8; 4]; 4] = [b"iCCP", b"gAMA", b"sRGB", b"cHRM"];

const PNG_SIGNATURE_LEN: usize = 8;

/// Re-encode a PNG at maximum compression.
///
/// Pixel data is preserved exactly; ancillary chunks are not carried over,
/// so files carrying color management chunks pass through untouched. The
/// result is only used when strictly smaller than the input.
pub fn optimize_png(source: &[u8]) -> Result<Outcome, TransformError> {
    let image = image::load_from_memory_with_format(source, ImageFormat::Png)
        .map_err(|e| TransformError::Image(e.to_string()))?;
    if has_color_chunks(source) {
        return Ok(Outcome::Unchanged);
    }

    let mut encoded = Vec::with_capacity(source.len());
    let encoder =
        PngEncoder::new_with_quality(&mut encoded, CompressionType::Best, FilterType::Adaptive);
    image
        .write_with_encoder(encoder)
        .map_err(|e| TransformError::Image(e.to_string()))?;

    Ok(Outcome::if_smaller(source, encoded))
}

/// Whether any chunk before the image data is a color management chunk.
fn has_color_chunks(source: &[u8]) -> bool {
    let mut pos = PNG_SIGNATURE_LEN;
    while let Some(header) = source.get(pos..pos + 8) {
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let kind = &header[4..8];
        if kind == b"IDAT" {
            return false;
        }
        if COLOR_CHUNKS.iter().any(|chunk| kind == chunk.as_slice()) {
            return true;
        }
        // length, type, data, crc
        pos = pos.saturating_add(12).saturating_add(len);
    }
    false
}

/// Decode to make sure the file is a valid image, then pass it through.
///
/// There is no lossless recompression for these formats here.
pub fn validate(source: &[u8], format: ImageFormat) -> Result<Outcome, TransformError> {
    image::load_from_memory_with_format(source, format)
        .map_err(|e| TransformError::Image(e.to_string()))?;
    Ok(Outcome::Unchanged)
}
