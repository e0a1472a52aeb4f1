//! Stage orchestration.
//!
//! # Architecture
//!
//! ```text
//! select ──► script ──► style ──► image ──► sitemap ──► permission ──► markup
//!   │          └────── rayon par_iter per stage ──────┘
//!   └─ structural failure aborts here, before any file is touched
//! ```
//!
//! Files are selected once, up front. Every stage runs to completion before
//! the next starts; within a transform stage files are processed in
//! parallel. Per-file failures are reported and never stop the run.

mod stage;

pub use stage::{STAGE_ORDER, Stage, StageSummary};

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::asset::{
    AssetClass, AssetSelector, MarkupMinifier, ScriptMinifier, SelectError, Selection,
    StyleMinifier, Transform,
};
use crate::config::OptimizeConfig;
use crate::diagnostic::{
    DiagnosticHandler, Reporter, image_diagnostic, markup_diagnostic, script_diagnostic,
    style_diagnostic, walk_diagnostic,
};
use crate::generator::{permission, sitemap};
use crate::image::ImageOptimizer;
use crate::log;
use crate::utils::plural_count;
use stage::TransformStage;

// =============================================================================
// Types
// =============================================================================

/// Result of a full run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// One summary per executed stage, in execution order.
    pub stages: Vec<StageSummary>,
    /// Diagnostics emitted during the run.
    pub diagnostics: usize,
}

impl RunReport {
    pub fn summary(&self, stage: Stage) -> Option<&StageSummary> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Total files rewritten by the transform stages.
    pub fn rewritten(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| s.stage.asset_class().is_some())
            .map(|s| s.rewritten)
            .sum()
    }

    pub fn failed(&self) -> usize {
        self.stages.iter().map(|s| s.failed).sum()
    }
}

/// Transform and the handler that renders its failures.
struct Capability {
    transform: Box<dyn Transform>,
    handler: DiagnosticHandler,
}

// =============================================================================
// Pipeline
// =============================================================================

/// A run over one working tree with a fixed file selection.
pub struct Pipeline<'a> {
    root: PathBuf,
    selection: Selection,
    domains: Vec<String>,
    layout: sitemap::SitemapLayout,
    mode: u32,
    capabilities: HashMap<AssetClass, Capability>,
    reporter: &'a dyn Reporter,
}

impl<'a> Pipeline<'a> {
    /// Select files and wire the default transforms.
    ///
    /// Fails if the tree cannot be read or a pattern does not compile.
    pub fn new(config: &OptimizeConfig, reporter: &'a dyn Reporter) -> Result<Self, SelectError> {
        let selection = AssetSelector::new(&config.root, config.assets.iter())?.select()?;

        let capabilities = HashMap::from([
            (
                AssetClass::Script,
                Capability {
                    transform: Box::new(ScriptMinifier),
                    handler: script_diagnostic,
                },
            ),
            (
                AssetClass::Style,
                Capability {
                    transform: Box::new(StyleMinifier),
                    handler: style_diagnostic,
                },
            ),
            (
                AssetClass::Image,
                Capability {
                    transform: Box::new(ImageOptimizer::default()),
                    handler: image_diagnostic,
                },
            ),
            (
                AssetClass::Markup,
                Capability {
                    transform: Box::new(MarkupMinifier),
                    handler: markup_diagnostic,
                },
            ),
        ]);

        Ok(Self {
            root: config.root.clone(),
            selection,
            domains: config.sitemap.domains.clone(),
            layout: sitemap::SitemapLayout {
                root: config.root.clone(),
                dir: config.sitemap.dir.clone(),
                index: config.sitemap.index.clone(),
            },
            mode: config.permission_mode(),
            capabilities,
            reporter,
        })
    }

    /// Replace the transform used for `class`. The handler is kept.
    pub fn with_transform(mut self, class: AssetClass, transform: impl Transform + 'static) -> Self {
        if let Some(capability) = self.capabilities.get_mut(&class) {
            capability.transform = Box::new(transform);
        }
        self
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Execute every stage in [`STAGE_ORDER`].
    pub fn run(&self) -> RunReport {
        let before = self.reporter.emitted();
        let mut artifacts = Vec::new();
        let mut report = RunReport::default();

        for issue in self.selection.issues() {
            self.reporter.emit(&walk_diagnostic(&self.root, issue));
        }

        for stage in STAGE_ORDER {
            let summary = match stage.asset_class() {
                Some(class) => self.run_transform(stage, class),
                None if stage == Stage::Sitemap => {
                    let (summary, produced) = self.run_sitemap();
                    artifacts = produced;
                    summary
                }
                None => self.run_permission(&artifacts),
            };
            if summary.attempted > 0 {
                log!(stage.name(); "{summary}");
            }
            report.stages.push(summary);
        }

        report.diagnostics = self.reporter.emitted().saturating_sub(before);
        report
    }

    fn run_transform(&self, stage: Stage, class: AssetClass) -> StageSummary {
        let files = self.selection.get(class);
        let Some(capability) = self.capabilities.get(&class) else {
            return StageSummary::new(stage);
        };

        TransformStage {
            stage,
            root: &self.root,
            transform: capability.transform.as_ref(),
            handler: capability.handler,
            reporter: self.reporter,
        }
        .run(files)
    }

    fn run_sitemap(&self) -> (StageSummary, Vec<PathBuf>) {
        let output = sitemap::synthesize(
            &self.domains,
            self.selection.get(AssetClass::Markup),
            &self.layout,
            self.reporter,
        );

        let mut summary = StageSummary::new(Stage::Sitemap);
        summary.attempted = self.domains.len();
        summary.rewritten = output.written;
        summary.failed = output.failed;
        (summary, output.artifacts)
    }

    fn run_permission(&self, artifacts: &[PathBuf]) -> StageSummary {
        let result = permission::normalize(&self.root, artifacts, self.mode, self.reporter);

        let mut summary = StageSummary::new(Stage::PermissionFix);
        summary.attempted = artifacts.len();
        summary.rewritten = result.applied;
        summary.failed = result.failed;
        summary
    }
}

// =============================================================================
// Entry point
// =============================================================================

/// Select on the calling thread, then run every stage on a dedicated pool.
pub fn run(config: &OptimizeConfig, reporter: &dyn Reporter) -> Result<RunReport> {
    let pipeline = Pipeline::new(config, reporter)?;
    log!(
        "select";
        "{} in {}",
        plural_count(pipeline.selection().len(), "file"),
        config.root.display()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_count())
        .build()
        .context("Failed to build worker pool")?;
    Ok(pool.install(|| pipeline.run()))
}
