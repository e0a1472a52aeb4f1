//! HTML minification.
//!
//! Conservative collapse: every whitespace run in text becomes one space and
//! is never removed, so inline siblings keep their separation. Tags are
//! copied as written. `<pre>`, `<textarea>`, `<script>` and `<style>` bodies
//! are left as they are. Comments are dropped, except conditional comments.

use std::path::Path;

use super::transform::{Outcome, Transform, TransformError};

/// Elements whose content is copied verbatim.
const RAW_TEXT: [&str; 4] = ["pre", "textarea", "script", "style"];

/// Minifies HTML documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupMinifier;

impl Transform for MarkupMinifier {
    fn apply(&self, _path: &Path, source: &[u8]) -> Result<Outcome, TransformError> {
        let text = std::str::from_utf8(source).map_err(|e| TransformError::Markup {
            offset: Some(e.valid_up_to()),
            message: e.to_string(),
        })?;
        let minified = collapse_html(text);
        Ok(Outcome::if_changed(source, minified.into_bytes()))
    }
}

/// Collapse whitespace runs and drop plain comments.
pub fn collapse_html(html: &str) -> String {
    let bytes = html.as_bytes();
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    // Set after a collapsed space; dropped comments leave it alone so the
    // runs on either side merge.
    let mut spaced = false;

    while pos < bytes.len() {
        let rest = &html[pos..];

        if rest.starts_with("<!--") {
            let (end, closed) = match rest.find("-->") {
                Some(i) => (i + 3, true),
                None => (rest.len(), false),
            };
            let comment = &rest[..end];
            if !closed || is_conditional_comment(comment) {
                out.push_str(comment);
                spaced = false;
            }
            pos += end;
            continue;
        }

        if bytes[pos] == b'<' && starts_tag(bytes.get(pos + 1).copied()) {
            let end = tag_end(rest);
            let tag = &rest[..end];
            out.push_str(tag);
            spaced = false;
            pos += end;

            if let Some(name) = raw_text_element(tag) {
                let body = closing_tag_start(&html[pos..], name);
                out.push_str(&html[pos..pos + body]);
                pos += body;
            }
            continue;
        }

        if bytes[pos].is_ascii_whitespace() {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if !spaced {
                out.push(' ');
                spaced = true;
            }
            continue;
        }

        let next = rest
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '<' || c.is_ascii_whitespace())
            .map_or(rest.len(), |(i, _)| i);
        out.push_str(&rest[..next]);
        spaced = false;
        pos += next;
    }

    out
}

/// `<!--[if IE]>` and `<!--<![endif]-->` style comments.
fn is_conditional_comment(comment: &str) -> bool {
    let body = &comment[4..];
    body.starts_with("[if") || body.starts_with("<![endif]")
}

/// Whether the byte after `<` opens a tag, a doctype or a closing tag.
fn starts_tag(next: Option<u8>) -> bool {
    next.is_some_and(|b| b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'))
}

/// Length of the tag at the start of `rest`, through its `>`.
///
/// Quoted attribute values may contain `>`. An unterminated tag runs to the
/// end of input.
fn tag_end(rest: &str) -> usize {
    let mut quote = None;
    for (i, b) in rest.bytes().enumerate().skip(1) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return i + 1,
            (None, _) => {}
        }
    }
    rest.len()
}

/// The raw-text element opened by `tag`, if any.
fn raw_text_element(tag: &str) -> Option<&'static str> {
    let name_end = tag[1..]
        .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
        .map_or(tag.len(), |i| i + 1);
    let name = &tag[1..name_end];
    if tag.ends_with("/>") {
        return None;
    }
    RAW_TEXT
        .into_iter()
        .find(|raw| name.eq_ignore_ascii_case(raw))
}

/// Offset of `</name` in `rest`, matched case-insensitively.
fn closing_tag_start(rest: &str, name: &str) -> usize {
    let needle = format!("</{name}");
    rest.as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
        .unwrap_or(rest.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minify(html: &str) -> String {
        match MarkupMinifier
            .apply(Path::new("index.html"), html.as_bytes())
            .unwrap()
        {
            Outcome::Rewritten(bytes) => String::from_utf8(bytes).unwrap(),
            Outcome::Unchanged => html.to_owned(),
        }
    }

    #[test]
    fn test_collapses_whitespace() {
        let out = minify(
            "<html>\n  <head>\n    <title>Hi</title>\n  </head>\n  <body>\n    <p>a    b</p>\n  </body>\n</html>\n",
        );
        assert!(out.contains("<p>a b</p>"));
        assert!(!out.contains("\n  "));
    }

    #[test]
    fn test_keeps_space_between_inline_siblings() {
        let out = minify(
            "<ul><li>Home</li> <li>About</li></ul><div><a href=\"/\">a</a>\n  <a href=\"/b\">b</a></div>",
        );
        assert_eq!(
            out,
            "<ul><li>Home</li> <li>About</li></ul><div><a href=\"/\">a</a> <a href=\"/b\">b</a></div>"
        );
    }

    #[test]
    fn test_preserves_pre() {
        let out = minify("<body><pre>  keep\n    this  </pre></body>");
        assert!(out.contains("<pre>  keep\n    this  </pre>"));
    }

    #[test]
    fn test_preserves_textarea_case_insensitive() {
        let out = minify("<TEXTAREA name=\"n\">a\n\n  b</TEXTAREA>   <p>x</p>");
        assert_eq!(out, "<TEXTAREA name=\"n\">a\n\n  b</TEXTAREA> <p>x</p>");
    }

    #[test]
    fn test_drops_comments() {
        let out = minify("<body><!-- note --><p>x</p></body>");
        assert_eq!(out, "<body><p>x</p></body>");
    }

    #[test]
    fn test_dropped_comment_merges_surrounding_space() {
        let out = minify("<p>a\n  <!-- gap -->\n  b</p>");
        assert_eq!(out, "<p>a b</p>");
    }

    #[test]
    fn test_keeps_conditional_comments() {
        let html = "<!--[if lt IE 9]><script src=\"shim.js\"></script><![endif]-->";
        assert_eq!(minify(html), html);
    }

    #[test]
    fn test_keeps_inline_script_body() {
        let out = minify("<body><script>var answer = 42;\n\n  if (a < b) {}</script></body>");
        assert!(out.contains("var answer = 42;\n\n  if (a < b) {}"));
    }

    #[test]
    fn test_attribute_values_untouched() {
        let out = minify("<a title=\"x  >  y\"   href='/'>go</a>");
        assert_eq!(out, "<a title=\"x  >  y\"   href='/'>go</a>");
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        assert_eq!(minify("<p>1 <  2</p>"), "<p>1 < 2</p>");
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let err = MarkupMinifier
            .apply(Path::new("index.html"), b"<p>ok</p>\xfe")
            .unwrap_err();
        assert!(matches!(err, TransformError::Markup { offset: Some(9), .. }));
    }
}
