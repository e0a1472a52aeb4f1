//! Path utilities.
//!
//! - [`fs`]: Filesystem path normalization and in-place writes

pub mod fs;

pub use fs::{expand_path, root_relative, write_in_place};
