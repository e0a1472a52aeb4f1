//! SVG optimization using usvg.
//!
//! usvg resolves styles, drops editor metadata and writes a compact tree.

use crate::asset::{Outcome, TransformError};

/// Options for SVG optimization
#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    /// DPI for unit conversion.
    pub dpi: f32,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self { dpi: 96.0 }
    }
}

/// Optimize SVG using usvg
///
/// Documents containing `<text>` pass through: without font shaping usvg
/// cannot keep text nodes. The result is only used when strictly smaller.
pub fn optimize_svg(content: &[u8], options: &OptimizeOptions) -> Result<Outcome, TransformError> {
    if contains_text(content) {
        return Ok(Outcome::Unchanged);
    }

    let usvg_options = usvg::Options {
        dpi: options.dpi,
        ..Default::default()
    };

    let tree = usvg::Tree::from_data(content, &usvg_options)
        .map_err(|e| TransformError::Image(format!("Failed to parse SVG: {e}")))?;

    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        ..Default::default()
    };

    let optimized = tree.to_string(&write_options);
    Ok(Outcome::if_smaller(content, optimized.into_bytes()))
}

/// Check for a `<text` element start tag.
#[inline]
fn contains_text(content: &[u8]) -> bool {
    content.windows(5).any(|w| w == b"<text")
}
