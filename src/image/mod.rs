//! Image optimization.
//!
//! Dispatches on file extension:
//!
//! | Format      | Action                                           |
//! |-------------|--------------------------------------------------|
//! | PNG         | lossless re-encode, kept only if smaller         |
//! | JPEG / GIF  | decoded to validate, otherwise passed through    |
//! | SVG         | normalized by usvg, kept only if smaller         |
//!
//! Passthrough is not a failure: a second run over an optimized tree leaves
//! every file byte-identical.

mod raster;
mod svg;

use std::path::Path;

use crate::asset::{Outcome, Transform, TransformError};

/// Image transform for the image stage.
#[derive(Debug, Clone, Default)]
pub struct ImageOptimizer {
    svg: svg::OptimizeOptions,
}

impl Transform for ImageOptimizer {
    fn apply(&self, path: &Path, source: &[u8]) -> Result<Outcome, TransformError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "png" => raster::optimize_png(source),
            "jpg" | "jpeg" => raster::validate(source, image::ImageFormat::Jpeg),
            "gif" => raster::validate(source, image::ImageFormat::Gif),
            "svg" => svg::optimize_svg(source, &self.svg),
            _ => Ok(Outcome::Unchanged),
        }
    }
}
