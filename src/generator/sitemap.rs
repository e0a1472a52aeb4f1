//! Multi-domain sitemap generation.
//!
//! For every domain, writes `<dir>/sitemap-<domain>.xml` listing the markup
//! pages of the tree, then writes one index at `<index>` that points at all
//! of them.
//!
//! # Index Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <sitemap>
//!     <loc>http://a.com/sitemap/sitemap-a-com.xml</loc>
//!     <lastmod>2025-01-01T00:00:00.000Z</lastmod>
//!   </sitemap>
//! </sitemapindex>
//! ```
//!
//! Every domain gets an index entry, including domains whose own sitemap
//! could not be written; those failures are reported as diagnostics.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use rayon::prelude::*;
use thiserror::Error;
use url::Url;

use crate::diagnostic::{Diagnostic, Reporter};
use crate::utils::path::root_relative;
use crate::{debug, log};

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const DEFAULT_SCHEME: &str = "http";

/// Characters escaped inside one URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Per-domain sitemap failures. Never fatal.
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("invalid domain `{domain}`: {reason}")]
    InvalidDomain { domain: String, reason: String },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where sitemap artifacts go, relative to the working tree.
#[derive(Debug, Clone)]
pub struct SitemapLayout {
    pub root: PathBuf,
    /// Directory holding per-domain files (e.g. `sitemap`).
    pub dir: PathBuf,
    /// Index file (e.g. `sitemap.xml`).
    pub index: PathBuf,
}

impl SitemapLayout {
    pub fn dir_path(&self) -> PathBuf {
        self.root.join(&self.dir)
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index)
    }

    /// URL path of the sitemap directory, without surrounding slashes.
    fn dir_url(&self) -> String {
        self.dir
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Result of a synthesis run.
#[derive(Debug, Default)]
pub struct SitemapOutput {
    /// Artifacts in write order: written per-domain files, the sitemap
    /// directory, the index.
    pub artifacts: Vec<PathBuf>,
    /// Domains whose sitemap was written.
    pub written: usize,
    /// Domain or index failures reported.
    pub failed: usize,
}

// ============================================================================
// Domain
// ============================================================================

/// One configured domain, optionally with an explicit scheme.
///
/// Scheme and host are normalized once (lowercase, default port dropped) and
/// every URL and filename for the domain is built from them.
#[derive(Debug, Clone)]
struct Domain {
    raw: String,
    scheme: String,
    host: String,
    /// Why the domain is unusable, if it is.
    invalid: Option<String>,
}

impl Domain {
    fn parse(raw: &str) -> Self {
        let (scheme, host) = raw.split_once("://").unwrap_or((DEFAULT_SCHEME, raw));
        let mut domain = Self {
            raw: raw.to_owned(),
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_ascii_lowercase(),
            invalid: None,
        };
        match Self::validate(scheme, host) {
            Ok(url) => {
                domain.scheme = url.scheme().to_owned();
                if let Some(host) = url.host_str() {
                    domain.host = match url.port() {
                        Some(port) => format!("{host}:{port}"),
                        None => host.to_owned(),
                    };
                }
            }
            Err(reason) => domain.invalid = Some(reason),
        }
        domain
    }

    /// Reject anything that is not a bare host.
    fn validate(scheme: &str, host: &str) -> Result<Url, String> {
        if host.is_empty() {
            return Err("empty host".into());
        }
        let url = Url::parse(&format!("{scheme}://{host}/")).map_err(|e| e.to_string())?;
        if url.host_str().is_none() || url.path() != "/" || url.query().is_some() {
            return Err("expected a bare host name".into());
        }
        Ok(url)
    }

    /// `sitemap-<host with dots replaced by dashes>.xml`
    fn filename(&self) -> String {
        format!("sitemap-{}.xml", self.host.replace('.', "-"))
    }

    fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    fn check(&self) -> Result<(), SitemapError> {
        match &self.invalid {
            Some(reason) => Err(SitemapError::InvalidDomain {
                domain: self.raw.clone(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Index entries
// ============================================================================

/// Reference from the index to one domain's sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: String,
}

impl SitemapEntry {
    fn new(domain: &Domain, layout: &SitemapLayout, now: DateTime<Utc>) -> Self {
        Self {
            loc: format!(
                "{}/{}/{}",
                domain.base_url(),
                layout.dir_url(),
                domain.filename()
            ),
            lastmod: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

fn index_xml(entries: &[SitemapEntry]) -> String {
    let mut xml = String::with_capacity(256 + entries.len() * 160);
    xml.push_str(XML_HEADER);
    xml.push_str("<sitemapindex xmlns=\"");
    xml.push_str(SITEMAP_NS);
    xml.push_str("\">");
    for entry in entries {
        xml.push_str("<sitemap><loc>");
        xml.push_str(&escape_xml(&entry.loc));
        xml.push_str("</loc><lastmod>");
        xml.push_str(&entry.lastmod);
        xml.push_str("</lastmod></sitemap>");
    }
    xml.push_str("</sitemapindex>");
    xml
}

// ============================================================================
// Per-domain sitemaps
// ============================================================================

/// One markup page of the tree.
#[derive(Debug, Clone)]
struct Page {
    /// URL path without leading slash (`docs/`, `about.html`, `` for root).
    path: String,
    lastmod: Option<String>,
}

impl Page {
    fn from_file(root: &Path, file: &Path) -> Self {
        let rel = root_relative(root, file);
        let mut segments: Vec<&str> = rel.split('/').collect();
        if let Some(last) = segments.last_mut()
            && (*last == "index.html" || *last == "index.htm")
        {
            *last = "";
        }
        let path = segments
            .iter()
            .map(|s| utf8_percent_encode(s, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");

        let lastmod = fs::metadata(file)
            .and_then(|m| m.modified())
            .ok()
            .map(format_date);

        Self { path, lastmod }
    }
}

fn format_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format("%Y-%m-%d").to_string()
}

fn urlset_xml(base: &str, pages: &[Page]) -> String {
    let mut xml = String::with_capacity(4096);

    xml.push_str(XML_HEADER);
    xml.push('\n');
    xml.push_str("<urlset xmlns=\"");
    xml.push_str(SITEMAP_NS);
    xml.push_str("\">\n");

    for page in pages {
        xml.push_str("  <url>\n    <loc>");
        xml.push_str(&escape_xml(&format!("{base}/{}", page.path)));
        xml.push_str("</loc>\n");
        if let Some(lastmod) = &page.lastmod {
            xml.push_str("    <lastmod>");
            xml.push_str(lastmod);
            xml.push_str("</lastmod>\n");
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

fn write_domain_sitemap(
    domain: &Domain,
    pages: &[Page],
    layout: &SitemapLayout,
) -> Result<PathBuf, SitemapError> {
    domain.check()?;
    let path = layout.dir_path().join(domain.filename());

    fs::write(&path, urlset_xml(&domain.base_url(), pages)).map_err(|source| SitemapError::Write {
        path: root_relative(&layout.root, &path),
        source,
    })?;
    Ok(path)
}

// ============================================================================
// Synthesis
// ============================================================================

/// Generate per-domain sitemaps and the index.
///
/// No-op for an empty domain list: nothing is created. Per-domain failures
/// are reported and do not stop the other domains.
pub fn synthesize(
    domains: &[String],
    markup: &[PathBuf],
    layout: &SitemapLayout,
    reporter: &dyn Reporter,
) -> SitemapOutput {
    if domains.is_empty() {
        debug!("sitemap"; "no domains, skipped");
        return SitemapOutput::default();
    }

    let mut output = SitemapOutput::default();

    // Entries record every domain up front, before its file is attempted.
    let now = Utc::now();
    let domains: Vec<Domain> = domains.iter().map(|raw| Domain::parse(raw)).collect();
    let entries: Vec<SitemapEntry> = domains
        .iter()
        .map(|domain| SitemapEntry::new(domain, layout, now))
        .collect();

    if let Err(e) = fs::create_dir_all(layout.dir_path()) {
        reporter.emit(&Diagnostic::new(format!(
            "failed to create {}: {e}",
            root_relative(&layout.root, &layout.dir_path())
        )));
        output.failed += 1;
    }

    let mut pages: Vec<Page> = markup
        .par_iter()
        .map(|file| Page::from_file(&layout.root, file))
        .collect();
    pages.sort_by(|a, b| a.path.cmp(&b.path));

    let results: Vec<Result<PathBuf, SitemapError>> = domains
        .par_iter()
        .map(|domain| write_domain_sitemap(domain, &pages, layout))
        .collect();

    for result in &results {
        match result {
            Ok(path) => {
                output.written += 1;
                debug!("sitemap"; "{}", root_relative(&layout.root, path));
            }
            Err(e) => {
                output.failed += 1;
                reporter.emit(&Diagnostic::new(e.to_string()));
            }
        }
    }

    let index_path = layout.index_path();
    match fs::write(&index_path, index_xml(&entries)) {
        Ok(()) => log!("sitemap"; "{} -> {}", entries.len(), root_relative(&layout.root, &index_path)),
        Err(e) => {
            output.failed += 1;
            reporter.emit(&Diagnostic::new(format!(
                "failed to write {}: {e}",
                root_relative(&layout.root, &index_path)
            )));
        }
    }

    output.artifacts = results.into_iter().filter_map(Result::ok).collect();
    output.artifacts.push(layout.dir_path());
    output.artifacts.push(index_path);
    output
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> Cow<'_, str> {
    // Fast path: check if escaping is needed
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::MemoryReporter;
    use tempfile::TempDir;

    fn layout(root: &Path) -> SitemapLayout {
        SitemapLayout {
            root: root.to_path_buf(),
            dir: PathBuf::from("sitemap"),
            index: PathBuf::from("sitemap.xml"),
        }
    }

    fn domains(list: &[&str]) -> Vec<String> {
        list.iter().map(|d| (*d).to_owned()).collect()
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("hello"), "hello");
        assert_eq!(escape_xml("<test>"), "&lt;test&gt;");
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("it's"), "it&apos;s");
    }

    #[test]
    fn test_domain_filename() {
        assert_eq!(Domain::parse("a.com").filename(), "sitemap-a-com.xml");
        assert_eq!(
            Domain::parse("https://www.b.co.uk").filename(),
            "sitemap-www-b-co-uk.xml"
        );
    }

    #[test]
    fn test_domain_validate() {
        assert!(Domain::parse("a.com").check().is_ok());
        assert!(Domain::parse("localhost:8080").check().is_ok());
        assert!(Domain::parse("a.com/blog").check().is_err());
        assert!(Domain::parse("bad host").check().is_err());
        assert!(Domain::parse("http://").check().is_err());
    }

    #[test]
    fn test_domain_normalized_once() {
        let domain = Domain::parse("HTTPS://WWW.A.Com:8080");
        assert_eq!(domain.base_url(), "https://www.a.com:8080");
        assert_eq!(domain.filename(), "sitemap-www-a-com:8080.xml");
        assert_eq!(Domain::parse("http://a.com:80").base_url(), "http://a.com");
    }

    #[test]
    fn test_entry_loc_and_lastmod() {
        let dir = TempDir::new().unwrap();
        let now = DateTime::parse_from_rfc3339("2025-03-04T05:06:07.089Z")
            .unwrap()
            .with_timezone(&Utc);
        let entry = SitemapEntry::new(&Domain::parse("a.com"), &layout(dir.path()), now);
        assert_eq!(entry.loc, "http://a.com/sitemap/sitemap-a-com.xml");
        assert_eq!(entry.lastmod, "2025-03-04T05:06:07.089Z");
    }

    #[test]
    fn test_index_xml_structure() {
        let entries = vec![SitemapEntry {
            loc: "http://a.com/sitemap/sitemap-a-com.xml".into(),
            lastmod: "2025-01-01T00:00:00.000Z".into(),
        }];
        let xml = index_xml(&entries);
        assert!(xml.starts_with(XML_HEADER));
        assert!(xml.contains(&format!(r#"<sitemapindex xmlns="{SITEMAP_NS}">"#)));
        assert!(xml.contains(
            "<sitemap><loc>http://a.com/sitemap/sitemap-a-com.xml</loc><lastmod>2025-01-01T00:00:00.000Z</lastmod></sitemap>"
        ));
        assert!(xml.ends_with("</sitemapindex>"));
    }

    #[test]
    fn test_page_urls() {
        let root = Path::new("/srv/build");
        assert_eq!(Page::from_file(root, &root.join("index.html")).path, "");
        assert_eq!(Page::from_file(root, &root.join("docs/index.htm")).path, "docs/");
        assert_eq!(Page::from_file(root, &root.join("about.html")).path, "about.html");
        assert_eq!(
            Page::from_file(root, &root.join("my page.html")).path,
            "my%20page.html"
        );
    }

    #[test]
    fn test_synthesize_two_domains() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("index.html"), "<p>home</p>").unwrap();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("docs/index.html"), "<p>docs</p>").unwrap();
        let markup = vec![root.join("docs/index.html"), root.join("index.html")];
        let reporter = MemoryReporter::new();

        let output = synthesize(
            &domains(&["a.com", "b.com"]),
            &markup,
            &layout(root),
            &reporter,
        );

        assert!(reporter.lines().is_empty());
        assert_eq!(output.written, 2);
        assert_eq!(output.failed, 0);

        let index = fs::read_to_string(root.join("sitemap.xml")).unwrap();
        assert_eq!(index.matches("<sitemap>").count(), 2);
        let a = index
            .find("<loc>http://a.com/sitemap/sitemap-a-com.xml</loc>")
            .unwrap();
        let b = index
            .find("<loc>http://b.com/sitemap/sitemap-b-com.xml</loc>")
            .unwrap();
        assert!(a < b);

        let a_map = fs::read_to_string(root.join("sitemap/sitemap-a-com.xml")).unwrap();
        assert!(a_map.contains("<loc>http://a.com/</loc>"));
        assert!(a_map.contains("<loc>http://a.com/docs/</loc>"));
        assert!(root.join("sitemap/sitemap-b-com.xml").exists());

        assert_eq!(
            output.artifacts,
            vec![
                root.join("sitemap/sitemap-a-com.xml"),
                root.join("sitemap/sitemap-b-com.xml"),
                root.join("sitemap"),
                root.join("sitemap.xml"),
            ]
        );
    }

    #[test]
    fn test_synthesize_mixed_case_domain() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("index.html"), "<p>home</p>").unwrap();
        let reporter = MemoryReporter::new();

        synthesize(
            &domains(&["A.Com"]),
            &[root.join("index.html")],
            &layout(root),
            &reporter,
        );

        assert!(reporter.lines().is_empty());
        let index = fs::read_to_string(root.join("sitemap.xml")).unwrap();
        assert!(index.contains("<loc>http://a.com/sitemap/sitemap-a-com.xml</loc>"), "{index}");
        let map = fs::read_to_string(root.join("sitemap/sitemap-a-com.xml")).unwrap();
        assert!(map.contains("<loc>http://a.com/</loc>"), "{map}");
    }

    #[test]
    fn test_synthesize_empty_is_noop() {
        let dir = TempDir::new().unwrap();
        let reporter = MemoryReporter::new();

        let output = synthesize(&[], &[], &layout(dir.path()), &reporter);

        assert!(output.artifacts.is_empty());
        assert!(!dir.path().join("sitemap").exists());
        assert!(!dir.path().join("sitemap.xml").exists());
        assert!(reporter.lines().is_empty());
    }

    #[test]
    fn test_synthesize_bad_domain_still_indexed() {
        let dir = TempDir::new().unwrap();
        let reporter = MemoryReporter::new();

        let output = synthesize(
            &domains(&["a.com", "bad host", "c.com"]),
            &[],
            &layout(dir.path()),
            &reporter,
        );

        assert_eq!(output.written, 2);
        assert_eq!(output.failed, 1);
        let lines = reporter.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[Error] invalid domain `bad host`"));

        let index = fs::read_to_string(dir.path().join("sitemap.xml")).unwrap();
        assert_eq!(index.matches("<sitemap>").count(), 3);
        assert!(dir.path().join("sitemap/sitemap-c-com.xml").exists());
        assert_eq!(output.artifacts.len(), 4);
    }
}
