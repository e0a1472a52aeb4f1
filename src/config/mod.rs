//! Run configuration, read from an optional `sitepress.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── assets     # [assets]
//! │   └── sitemap    # [sitemap]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! ├── util.rs        # Domain list parsing
//! └── mod.rs         # OptimizeConfig (this file)
//! ```
//!
//! # Precedence
//!
//! CLI flags, then the `DOMAIN_NAMES` environment variable, then the file,
//! then built-in defaults.
//!
//! # Example
//!
//! ```toml
//! root = "build"
//! jobs = 0
//! strict = false
//!
//! [assets]
//! script = ["**/*.js"]
//!
//! [sitemap]
//! domains = ["example.com"]
//! mode = "777"
//! ```

pub mod section;
pub mod types;
mod util;

pub use section::{AssetsConfig, SitemapConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};
pub use util::{DOMAIN_ENV, normalize_domains, parse_domain_list};

use crate::cli::Cli;
use crate::log;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file looked up in the current directory when `--config` is absent.
pub const DEFAULT_CONFIG: &str = "sitepress.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sitepress.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeConfig {
    /// Working tree, optimized in place.
    pub root: PathBuf,

    /// Worker threads; 0 uses available parallelism.
    pub jobs: usize,

    /// Exit non-zero when any diagnostic was emitted.
    pub strict: bool,

    /// Glob patterns per asset class
    pub assets: AssetsConfig,

    /// Sitemap domains and artifact layout
    pub sitemap: SitemapConfig,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            root: "build".into(),
            jobs: 0,
            strict: false,
            assets: AssetsConfig::default(),
            sitemap: SitemapConfig::default(),
        }
    }
}

impl OptimizeConfig {
    pub const ROOT: FieldPath = FieldPath::new("root");

    /// Load configuration from CLI arguments, environment and config file.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match &cli.config {
            Some(path) => Self::from_path(&cwd.join(path))?,
            None => {
                let path = cwd.join(DEFAULT_CONFIG);
                if path.is_file() {
                    Self::from_path(&path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(std::env::var(DOMAIN_ENV).ok().as_deref());
        config.apply_cli(cli);
        config.validate()?;
        config.finalize(&cwd);

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        log!("config"; "loaded {}", path.display());
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // overrides
    // ========================================================================

    /// Apply the `DOMAIN_NAMES` value, if set.
    ///
    /// A set but empty variable clears the file's domains.
    fn apply_env(&mut self, domain_names: Option<&str>) {
        if let Some(raw) = domain_names {
            self.sitemap.domains = parse_domain_list(raw);
        }
    }

    /// Apply CLI flags.
    fn apply_cli(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        Self::update_option(&mut self.root, cli.root.as_ref());
        Self::update_option(&mut self.jobs, cli.jobs.as_ref());
        Self::update_option(&mut self.sitemap.domains, cli.domains.as_ref());
        self.strict |= cli.strict;

        self.sitemap.domains = normalize_domains(self.sitemap.domains.iter().map(String::as_str));
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve `root` to an absolute path.
    fn finalize(&mut self, cwd: &Path) {
        self.root = crate::utils::path::expand_path(&self.root, cwd);
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        if self.root.as_os_str().is_empty() {
            diag.error(Self::ROOT, "must not be empty");
        }
        self.assets.validate(&mut diag);
        self.sitemap.validate(&mut diag);

        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    // ========================================================================
    // accessors
    // ========================================================================

    /// Effective worker thread count.
    pub fn worker_count(&self) -> usize {
        match self.jobs {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        }
    }

    /// Permission bits for sitemap artifacts. Falls back to the default mode
    /// when called on an unvalidated config.
    pub fn permission_mode(&self) -> u32 {
        self.sitemap.mode_bits().unwrap_or(0o777)
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sitepress").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = OptimizeConfig::parse_with_ignored("[sitemap\ndomains = []");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_default_config() {
        let config = OptimizeConfig::default();
        assert_eq!(config.root, PathBuf::from("build"));
        assert_eq!(config.jobs, 0);
        assert!(!config.strict);
        assert!(config.sitemap.domains.is_empty());
        assert_eq!(config.permission_mode(), 0o777);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_is_default() {
        let (config, ignored) = OptimizeConfig::parse_with_ignored("").unwrap();
        assert_eq!(config, OptimizeConfig::default());
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "root = \"public\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = OptimizeConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.root, PathBuf::from("public"));
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_env_overrides_file() {
        let (mut config, _) =
            OptimizeConfig::parse_with_ignored("[sitemap]\ndomains = [\"file.com\"]").unwrap();
        config.apply_env(Some("a.com, b.com"));
        assert_eq!(config.sitemap.domains, vec!["a.com", "b.com"]);
    }

    #[test]
    fn test_unset_env_keeps_file() {
        let (mut config, _) =
            OptimizeConfig::parse_with_ignored("[sitemap]\ndomains = [\"file.com\"]").unwrap();
        config.apply_env(None);
        assert_eq!(config.sitemap.domains, vec!["file.com"]);
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = OptimizeConfig::default();
        config.apply_env(Some("env.com"));
        config.apply_cli(&cli(&["--domains", "cli.com, ,other.com", "--jobs", "2", "--strict"]));

        assert_eq!(config.sitemap.domains, vec!["cli.com", "other.com"]);
        assert_eq!(config.jobs, 2);
        assert_eq!(config.worker_count(), 2);
        assert!(config.strict);
    }

    #[test]
    fn test_file_domains_are_normalized() {
        let (mut config, _) =
            OptimizeConfig::parse_with_ignored("[sitemap]\ndomains = [\" a.com \", \"\"]").unwrap();
        config.apply_cli(&cli(&[]));
        assert_eq!(config.sitemap.domains, vec!["a.com"]);
    }

    #[test]
    fn test_validate_collects_errors() {
        let content = r#"
[assets]
script = []

[sitemap]
mode = "rwx"
"#;
        let (config, _) = OptimizeConfig::parse_with_ignored(content).unwrap();
        let Err(ConfigError::Diagnostics(diag)) = config.validate() else {
            panic!("expected validation diagnostics");
        };
        assert_eq!(diag.len(), 2);
    }

    #[test]
    fn test_finalize_resolves_root() {
        let mut config = OptimizeConfig::default();
        config.finalize(Path::new("/nonexistent-sitepress/site"));
        assert_eq!(config.root, PathBuf::from("/nonexistent-sitepress/site/build"));
    }
}
