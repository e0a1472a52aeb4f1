//! Script and stylesheet minification.
//!
//! Uses oxc for JavaScript and lightningcss for CSS. Files already named
//! `*.min.js` / `*.min.css` pass through untouched.

use std::path::Path;
use std::sync::{Arc, RwLock};

use lightningcss::error::ErrorLocation;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::transform::{Outcome, Transform, TransformError, line_at};

/// Whether the file stem already carries a `.min` marker.
fn is_minified(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.ends_with(".min"))
}

/// Decode `source` as UTF-8, reporting the first invalid byte.
fn decode(source: &[u8]) -> Result<&str, (usize, String)> {
    std::str::from_utf8(source).map_err(|e| (e.valid_up_to(), e.to_string()))
}

// ============================================================================
// JavaScript
// ============================================================================

/// Minifies JavaScript with compression and mangling.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptMinifier;

impl Transform for ScriptMinifier {
    fn apply(&self, path: &Path, source: &[u8]) -> Result<Outcome, TransformError> {
        if is_minified(path) {
            return Ok(Outcome::Unchanged);
        }
        let text = decode(source).map_err(|(offset, message)| TransformError::Script {
            line: Some(line_at(source, offset)),
            message,
        })?;

        // .mjs is an ES module
        let is_module = path.extension().is_some_and(|ext| ext == "mjs");
        let minified = minify_js(text, is_module)?;
        Ok(Outcome::if_changed(source, minified.into_bytes()))
    }
}

/// Minify JavaScript source code.
pub fn minify_js(source: &str, is_module: bool) -> Result<String, TransformError> {
    let allocator = Allocator::default();
    // Classic scripts share one global scope with every other script on the
    // page, so their top-level names are neither dropped nor renamed.
    let source_type = if is_module {
        SourceType::mjs()
    } else {
        SourceType::script()
    };
    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(error) = ret.errors.first() {
        let offset = error
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map(|label| label.offset());
        return Err(TransformError::Script {
            line: offset.map(|o| line_at(source.as_bytes(), o)),
            message: error.message.to_string(),
        });
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions {
            top_level: Some(is_module),
            ..MangleOptions::default()
        }),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

// ============================================================================
// CSS
// ============================================================================

/// Minifies CSS stylesheets.
#[derive(Debug, Default, Clone, Copy)]
pub struct StyleMinifier;

impl Transform for StyleMinifier {
    fn apply(&self, path: &Path, source: &[u8]) -> Result<Outcome, TransformError> {
        if is_minified(path) {
            return Ok(Outcome::Unchanged);
        }
        let text = decode(source).map_err(|(offset, message)| TransformError::Style {
            line: Some(line_at(source, offset)),
            errors: vec![message],
        })?;
        let minified = minify_css(text)?;
        Ok(Outcome::if_changed(source, minified.into_bytes()))
    }
}

/// Minify CSS source code.
///
/// Invalid rules and declarations are collected as warnings. Any warning
/// fails the file; the message lists errors first, then warnings.
pub fn minify_css(source: &str) -> Result<String, TransformError> {
    let warnings = Arc::new(RwLock::new(Vec::new()));
    let options = ParserOptions {
        error_recovery: true,
        warnings: Some(Arc::clone(&warnings)),
        ..ParserOptions::default()
    };

    let result = StyleSheet::parse(source, options)
        .map_err(|e| (css_line(e.loc.as_ref()), e.kind.to_string()))
        .and_then(|stylesheet| {
            stylesheet
                .to_css(PrinterOptions {
                    minify: true,
                    ..PrinterOptions::default()
                })
                .map_err(|e| (css_line(e.loc.as_ref()), e.kind.to_string()))
        });

    let collected: Vec<(Option<usize>, String)> = warnings
        .read()
        .map(|list| {
            list.iter()
                .map(|w| (css_line(w.loc.as_ref()), w.kind.to_string()))
                .collect()
        })
        .unwrap_or_default();

    match result {
        Ok(output) if collected.is_empty() => Ok(output.code),
        Ok(_) => Err(TransformError::Style {
            line: collected.first().and_then(|(line, _)| *line),
            errors: collected.into_iter().map(|(_, message)| message).collect(),
        }),
        Err((line, error)) => Err(TransformError::Style {
            line,
            errors: std::iter::once(error)
                .chain(collected.into_iter().map(|(_, message)| message))
                .collect(),
        }),
    }
}

/// lightningcss lines are 0-based.
fn css_line(loc: Option<&ErrorLocation>) -> Option<usize> {
    loc.map(|loc| loc.line as usize + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_js_shrinks() {
        let source = "function add(first, second) {\n  // sum\n  return first + second;\n}\n";
        let out = minify_js(source, false).unwrap();
        assert!(out.len() < source.len());
        assert!(!out.contains("// sum"));
    }

    #[test]
    fn test_minify_js_keeps_global_names() {
        let out = minify_js("function greet(name) { return 'hi ' + name; }", false).unwrap();
        assert!(out.contains("greet"));
    }

    #[test]
    fn test_minify_js_keeps_unused_globals() {
        let source = "function greet(name) {\n  return 'hi ' + name;\n}\nvar config = { debug: true };\n";
        let out = minify_js(source, false).unwrap();
        assert!(out.contains("greet"), "{out}");
        assert!(out.contains("config"), "{out}");
        assert!(out.len() < source.len());
    }

    #[test]
    fn test_minify_js_module_drops_unused_locals() {
        let out = minify_js("const unused = 1;\nexport const used = 2;\n", true).unwrap();
        assert!(!out.contains("unused"), "{out}");
    }

    #[test]
    fn test_minify_js_reports_line() {
        let err = minify_js("let a = 1;\nlet b = ;\n", false).unwrap_err();
        match err {
            TransformError::Script { line, message } => {
                assert_eq!(line, Some(2));
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_script_minifier_skips_min_files() {
        let out = ScriptMinifier
            .apply(Path::new("vendor/jquery.min.js"), b"var   a = 1 ;")
            .unwrap();
        assert_eq!(out, Outcome::Unchanged);
    }

    #[test]
    fn test_script_minifier_rejects_invalid_utf8() {
        let err = ScriptMinifier
            .apply(Path::new("app.js"), b"var a = 1;\n\xff")
            .unwrap_err();
        assert!(matches!(err, TransformError::Script { line: Some(2), .. }));
    }

    #[test]
    fn test_minify_css_shrinks() {
        let source = "body {\n  color: #ff0000;\n  margin: 0px;\n}\n";
        let out = minify_css(source).unwrap();
        assert!(out.len() < source.len());
        assert!(out.starts_with("body{"));
    }

    #[test]
    fn test_minify_css_reports_error() {
        let err = minify_css("div:::hover {\n  color: red;\n}\n").unwrap_err();
        assert!(matches!(err, TransformError::Style { .. }));
    }

    #[test]
    fn test_minify_css_collects_every_warning() {
        let source = "a {\n  color: red;\n}\ndiv:::hover {\n  color: blue;\n}\np::: {\n  margin: 0;\n}\n";
        let err = minify_css(source).unwrap_err();
        match err {
            TransformError::Style { line, errors } => {
                assert_eq!(line, Some(4));
                assert_eq!(errors.len(), 2, "{errors:?}");
                assert!(errors.iter().all(|e| !e.is_empty()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_style_minifier_unchanged_when_already_minimal() {
        let out = StyleMinifier
            .apply(Path::new("a.css"), b"a{color:red}")
            .unwrap();
        assert_eq!(out, Outcome::Unchanged);
    }
}
