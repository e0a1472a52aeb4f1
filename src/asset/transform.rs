//! Transform capability shared by every asset class.

use std::path::Path;

use thiserror::Error;

/// What a transform produced for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// New bytes to write back to the same path.
    Rewritten(Vec<u8>),
    /// Nothing to improve; the file stays as it is.
    Unchanged,
}

impl Outcome {
    /// Rewrite only when the output differs from the input.
    pub fn if_changed(source: &[u8], output: Vec<u8>) -> Self {
        if output == source {
            Self::Unchanged
        } else {
            Self::Rewritten(output)
        }
    }

    /// Rewrite only when the output is strictly smaller than the input.
    pub fn if_smaller(source: &[u8], output: Vec<u8>) -> Self {
        if output.len() < source.len() {
            Self::Rewritten(output)
        } else {
            Self::Unchanged
        }
    }
}

/// Raw failure payload of a transform, one variant per kind.
///
/// Turned into a [`crate::diagnostic::Diagnostic`] by the handler the stage
/// was built with.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{message}")]
    Script {
        line: Option<usize>,
        message: String,
    },

    #[error("{}", errors.join(": "))]
    Style { line: Option<usize>, errors: Vec<String> },

    #[error("{message}")]
    Markup {
        offset: Option<usize>,
        message: String,
    },

    #[error("{0}")]
    Image(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// A per-class transform capability.
///
/// Implementations must be pure with respect to the file system: the stage
/// owns reading and writing.
pub trait Transform: Send + Sync {
    fn apply(&self, path: &Path, source: &[u8]) -> Result<Outcome, TransformError>;
}

/// 1-based line number of a byte offset.
pub fn line_at(source: &[u8], offset: usize) -> usize {
    let end = offset.min(source.len());
    source[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_if_changed() {
        assert_eq!(Outcome::if_changed(b"a", b"a".to_vec()), Outcome::Unchanged);
        assert_eq!(
            Outcome::if_changed(b"a ", b"a".to_vec()),
            Outcome::Rewritten(b"a".to_vec())
        );
    }

    #[test]
    fn test_if_smaller() {
        assert_eq!(Outcome::if_smaller(b"ab", b"ab".to_vec()), Outcome::Unchanged);
        assert_eq!(Outcome::if_smaller(b"ab", b"abc".to_vec()), Outcome::Unchanged);
        assert_eq!(
            Outcome::if_smaller(b"abc", b"ab".to_vec()),
            Outcome::Rewritten(b"ab".to_vec())
        );
    }

    #[test]
    fn test_line_at() {
        let source = b"a\nb\nc";
        assert_eq!(line_at(source, 0), 1);
        assert_eq!(line_at(source, 2), 2);
        assert_eq!(line_at(source, 4), 3);
        assert_eq!(line_at(source, 100), 3);
    }

    #[test]
    fn test_style_error_display_joins() {
        let err = TransformError::Style {
            line: None,
            errors: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "a: b");
    }
}
