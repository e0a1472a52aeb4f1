//! Sitepress - in-place post-processing for built static sites.

mod asset;
mod cli;
mod config;
mod diagnostic;
mod generator;
mod image;
mod logger;
mod pipeline;
mod utils;

use anyhow::{Result, bail};
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::OptimizeConfig;
use diagnostic::StdoutReporter;
use utils::plural_count;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = OptimizeConfig::load(&cli)?;
    let reporter = StdoutReporter::new();
    let report = pipeline::run(&config, &reporter)?;

    log!(
        "done";
        "{} rewritten, {}",
        plural_count(report.rewritten(), "file"),
        plural_count(report.diagnostics, "error")
    );

    if config.strict && report.diagnostics > 0 {
        bail!(
            "strict mode: {} reported",
            plural_count(report.diagnostics, "error")
        );
    }
    Ok(())
}
