//! Failure records and their one-line `[Error]` rendering.
//!
//! Every stage reports through the same format so the caller can pick the
//! lines out of mixed output:
//!
//! ```text
//! [Error] <path>:<line>:<message>
//! ```
//!
//! Segments are omitted when absent. Line breaks inside segments are removed,
//! so a multi-line compiler message still produces exactly one line.
//!
//! - [`handler`]: pure functions turning a transform payload into a [`Diagnostic`]
//! - [`reporter`]: sinks that emit rendered lines

pub mod handler;
pub mod reporter;

pub use handler::{
    DiagnosticHandler, image_diagnostic, io_diagnostic, markup_diagnostic, script_diagnostic,
    style_diagnostic, walk_diagnostic,
};
pub use reporter::{Reporter, StdoutReporter};

#[cfg(test)]
pub use reporter::MemoryReporter;

use std::fmt;
use std::path::Path;

use crate::utils::path::root_relative;

/// Prefix the caller scans for.
pub const ERROR_PREFIX: &str = "[Error] ";

/// Message used when a payload carries nothing printable.
const UNKNOWN_ERROR: &str = "Unknown error";

/// Where in a file a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// 1-based line number.
    Line(usize),
    /// Byte offset into the file.
    Offset(usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(n) | Self::Offset(n) => write!(f, "{n}"),
        }
    }
}

/// A normalized failure record.
///
/// `path`, when present, is always relative to the working-tree root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: Option<String>,
    pub location: Option<Location>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: None,
            location: None,
            message: message.into(),
        }
    }

    /// Attach `file`, made relative to `root`.
    pub fn with_path(mut self, root: &Path, file: &Path) -> Self {
        let rel = root_relative(root, file);
        self.path = (!rel.is_empty()).then_some(rel);
        self
    }

    pub fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    /// Render as a single `[Error] ...` line (no trailing newline).
    pub fn render(&self) -> String {
        format!("{ERROR_PREFIX}{self}")
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut segments: Vec<String> = Vec::with_capacity(3);
        if let Some(path) = self.path.as_deref().filter(|p| !p.is_empty()) {
            segments.push(path.to_owned());
        }
        if let Some(location) = self.location {
            segments.push(location.to_string());
        }
        if !self.message.trim().is_empty() {
            segments.push(self.message.clone());
        }
        if segments.is_empty() {
            segments.push(UNKNOWN_ERROR.to_owned());
        }

        let line = segments.join(":").replace(['\r', '\n'], "");
        f.write_str(&line)
    }
}
