//! `[sitemap]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [sitemap]
//! domains = ["example.com", "example.org"]
//! dir = "sitemap"
//! index = "sitemap.xml"
//! mode = "755"
//! ```

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    /// Domains to generate sitemaps for. Empty disables the stage.
    pub domains: Vec<String>,
    /// Directory for per-domain sitemaps, relative to the root.
    pub dir: PathBuf,
    /// Index file, relative to the root.
    pub index: PathBuf,
    /// Octal permission mode applied to every sitemap artifact.
    pub mode: String,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            dir: "sitemap".into(),
            index: "sitemap.xml".into(),
            mode: "777".into(),
        }
    }
}

impl SitemapConfig {
    pub const DOMAINS: FieldPath = FieldPath::new("sitemap.domains");
    pub const DIR: FieldPath = FieldPath::new("sitemap.dir");
    pub const INDEX: FieldPath = FieldPath::new("sitemap.index");
    pub const MODE: FieldPath = FieldPath::new("sitemap.mode");

    /// Parsed permission bits, `None` if `mode` is not a valid octal mode.
    pub fn mode_bits(&self) -> Option<u32> {
        parse_mode(&self.mode)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.mode_bits().is_none() {
            diag.error_with_hint(
                Self::MODE,
                format!("invalid permission mode `{}`", self.mode),
                "use three or four octal digits, e.g. \"755\"",
            );
        }
        for (field, path) in [(Self::DIR, &self.dir), (Self::INDEX, &self.index)] {
            if let Some(problem) = path_problem(path) {
                diag.error(field, format!("`{}` {problem}", path.display()));
            }
        }
        if self.index.starts_with(&self.dir) {
            diag.error(
                Self::INDEX,
                format!(
                    "`{}` must not be inside `{}`",
                    self.index.display(),
                    self.dir.display()
                ),
            );
        }
    }
}

/// Parse an octal mode string such as `"755"` or `"0644"`.
pub fn parse_mode(mode: &str) -> Option<u32> {
    let digits = mode.trim().trim_start_matches("0o");
    if digits.is_empty() || digits.len() > 4 {
        return None;
    }
    u32::from_str_radix(digits, 8).ok()
}

fn path_problem(path: &Path) -> Option<&'static str> {
    if path.as_os_str().is_empty() {
        return Some("must not be empty");
    }
    if path.is_absolute() || path.has_root() {
        return Some("must be relative to the root");
    }
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Some("must stay inside the root");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let sitemap = SitemapConfig::default();
        assert!(sitemap.domains.is_empty());
        assert_eq!(sitemap.dir, Path::new("sitemap"));
        assert_eq!(sitemap.index, Path::new("sitemap.xml"));
        assert_eq!(sitemap.mode_bits(), Some(0o777));
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("755"), Some(0o755));
        assert_eq!(parse_mode("0644"), Some(0o644));
        assert_eq!(parse_mode("0o600"), Some(0o600));
        assert_eq!(parse_mode("rwx"), None);
        assert_eq!(parse_mode("9"), None);
        assert_eq!(parse_mode(""), None);
        assert_eq!(parse_mode("77777"), None);
    }

    #[test]
    fn test_validate_paths() {
        let sitemap = SitemapConfig {
            dir: "../outside".into(),
            index: "/abs/sitemap.xml".into(),
            mode: "abc".into(),
            ..Default::default()
        };
        let mut diag = ConfigDiagnostics::new();
        sitemap.validate(&mut diag);

        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["sitemap.mode", "sitemap.dir", "sitemap.index"]);
    }

    #[test]
    fn test_validate_index_inside_dir() {
        let sitemap = SitemapConfig {
            index: "sitemap/index.xml".into(),
            ..Default::default()
        };
        let mut diag = ConfigDiagnostics::new();
        sitemap.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}
