//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Post-process a built static site: minify scripts, styles and markup,
/// optimize images, and write per-domain sitemaps.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Working tree to optimize in place (default: build)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Config file path (default: sitepress.toml, optional)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Comma-separated domains for sitemap generation (overrides DOMAIN_NAMES)
    #[arg(short, long, value_delimiter = ',')]
    pub domains: Option<Vec<String>>,

    /// Worker threads (0 = available parallelism)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Exit non-zero when any file failed
    #[arg(short, long)]
    pub strict: bool,

    /// Show per-file progress
    #[arg(short, long)]
    pub verbose: bool,
}
