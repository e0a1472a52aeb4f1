//! Asset classes, selection, and the text transforms.

mod kind;
pub mod markup;
pub mod minify;
mod scan;
mod transform;

// Types
pub use kind::AssetClass;
pub use transform::{Outcome, Transform, TransformError};

// Selection (pure functions)
pub use scan::{AssetSelector, SelectError, Selection, WalkIssue};

// Transforms
pub use markup::MarkupMinifier;
pub use minify::{ScriptMinifier, StyleMinifier};
