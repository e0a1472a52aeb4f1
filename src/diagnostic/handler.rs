//! Per-kind diagnostic handlers.
//!
//! Each transform kind reports a different payload shape. A handler is a
//! pure function from that payload to a [`Diagnostic`]; stages are built with
//! the handler that matches their transform.

use std::path::Path;

use super::{Diagnostic, Location};
use crate::asset::{TransformError, WalkIssue};

/// Signature shared by all handlers: working-tree root, failing file, payload.
pub type DiagnosticHandler = fn(&Path, &Path, &TransformError) -> Diagnostic;

/// Script failures carry a line and the parser message.
pub fn script_diagnostic(root: &Path, file: &Path, err: &TransformError) -> Diagnostic {
    match err {
        TransformError::Script { line, message } => Diagnostic::new(message.as_str())
            .with_path(root, file)
            .with_location(line.map(Location::Line)),
        other => io_diagnostic(root, file, other),
    }
}

/// Style failures carry every parser/printer error, joined by `:`.
pub fn style_diagnostic(root: &Path, file: &Path, err: &TransformError) -> Diagnostic {
    match err {
        TransformError::Style { line, errors } => Diagnostic::new(errors.join(":"))
            .with_path(root, file)
            .with_location(line.map(Location::Line)),
        other => io_diagnostic(root, file, other),
    }
}

/// Markup failures carry a byte offset when one is known.
pub fn markup_diagnostic(root: &Path, file: &Path, err: &TransformError) -> Diagnostic {
    match err {
        TransformError::Markup { offset, message } => Diagnostic::new(message.as_str())
            .with_path(root, file)
            .with_location(offset.map(Location::Offset)),
        other => io_diagnostic(root, file, other),
    }
}

/// Image failures are reported uniformly; the decoder detail is only logged.
pub fn image_diagnostic(root: &Path, file: &Path, err: &TransformError) -> Diagnostic {
    match err {
        TransformError::Image(_) => Diagnostic::new("Failed to optimize").with_path(root, file),
        other => io_diagnostic(root, file, other),
    }
}

/// A tree entry the selection walk could not read.
pub fn walk_diagnostic(root: &Path, issue: &WalkIssue) -> Diagnostic {
    let diagnostic = Diagnostic::new(issue.message.as_str());
    match &issue.path {
        Some(path) => diagnostic.with_path(root, path),
        None => diagnostic,
    }
}

/// Fallback: path plus the payload's display form.
pub fn io_diagnostic(root: &Path, file: &Path, err: &TransformError) -> Diagnostic {
    Diagnostic::new(err.to_string()).with_path(root, file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> &'static Path {
        Path::new("/tmp/optimizer/build")
    }

    #[test]
    fn test_script_diagnostic() {
        let err = TransformError::Script {
            line: Some(12),
            message: "Unexpected token: foo".into(),
        };
        let diag = script_diagnostic(root(), &root().join("app.js"), &err);
        assert_eq!(diag.render(), "[Error] app.js:12:Unexpected token: foo");
    }

    #[test]
    fn test_style_diagnostic_joins_errors() {
        let err = TransformError::Style {
            line: None,
            errors: vec!["Unexpected token".into(), "Invalid\nselector".into()],
        };
        let diag = style_diagnostic(root(), &root().join("css/site.css"), &err);
        assert_eq!(
            diag.render(),
            "[Error] css/site.css:Unexpected token:Invalidselector"
        );
    }

    #[test]
    fn test_style_diagnostic_from_stylesheet() {
        let err = crate::asset::minify::minify_css("a:::b { color: red }\ni:::j { color: blue }\n")
            .unwrap_err();
        let TransformError::Style { errors, .. } = &err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(errors.len(), 2, "{errors:?}");

        let line = style_diagnostic(root(), &root().join("site.css"), &err).render();
        assert_eq!(line, format!("[Error] site.css:1:{}", errors.join(":")));
    }

    #[test]
    fn test_markup_diagnostic_offset() {
        let err = TransformError::Markup {
            offset: Some(40),
            message: "invalid UTF-8".into(),
        };
        let diag = markup_diagnostic(root(), &root().join("index.html"), &err);
        assert_eq!(diag.render(), "[Error] index.html:40:invalid UTF-8");
    }

    #[test]
    fn test_image_diagnostic_is_uniform() {
        let err = TransformError::Image("Format error decoding Png".into());
        let diag = image_diagnostic(root(), &root().join("img/logo.png"), &err);
        assert_eq!(diag.render(), "[Error] img/logo.png:Failed to optimize");
    }

    #[test]
    fn test_walk_diagnostic_relative_path() {
        let issue = WalkIssue {
            path: Some(root().join("assets/private")),
            message: "Permission denied (os error 13)".into(),
        };
        assert_eq!(
            walk_diagnostic(root(), &issue).render(),
            "[Error] assets/private:Permission denied (os error 13)"
        );

        let pathless = WalkIssue {
            path: None,
            message: "loop detected".into(),
        };
        assert_eq!(walk_diagnostic(root(), &pathless).render(), "[Error] loop detected");
    }

    #[test]
    fn test_io_falls_through_every_handler() {
        let io = || TransformError::Io(std::io::Error::other("permission denied"));
        let file = root().join("a.js");
        for handler in [
            script_diagnostic as DiagnosticHandler,
            style_diagnostic,
            markup_diagnostic,
            image_diagnostic,
        ] {
            assert_eq!(
                handler(root(), &file, &io()).render(),
                "[Error] a.js:permission denied"
            );
        }
    }
}
