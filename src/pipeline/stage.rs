//! Stage definitions and the per-file transform runner.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::asset::{AssetClass, Outcome, Transform, TransformError};
use crate::debug;
use crate::diagnostic::{DiagnosticHandler, Reporter};
use crate::utils::path::{root_relative, write_in_place};
use crate::utils::plural_count;

/// One step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Script,
    Style,
    Image,
    Sitemap,
    PermissionFix,
    Markup,
}

/// Stages in execution order. Each stage finishes before the next starts.
///
/// Markup runs last so it sees the already minified scripts and styles, and
/// permissions are fixed right after the sitemap artifacts exist.
pub const STAGE_ORDER: [Stage; 6] = [
    Stage::Script,
    Stage::Style,
    Stage::Image,
    Stage::Sitemap,
    Stage::PermissionFix,
    Stage::Markup,
];

impl Stage {
    /// Log prefix.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Style => "style",
            Self::Image => "image",
            Self::Sitemap => "sitemap",
            Self::PermissionFix => "permission",
            Self::Markup => "markup",
        }
    }

    /// Asset class transformed by this stage, `None` for generator stages.
    pub const fn asset_class(self) -> Option<AssetClass> {
        match self {
            Self::Script => Some(AssetClass::Script),
            Self::Style => Some(AssetClass::Style),
            Self::Image => Some(AssetClass::Image),
            Self::Markup => Some(AssetClass::Markup),
            Self::Sitemap | Self::PermissionFix => None,
        }
    }

    /// Unit counted in the summary line.
    const fn unit(self) -> &'static str {
        match self {
            Self::Sitemap => "domain",
            Self::PermissionFix => "artifact",
            _ => "file",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Counts for one finished stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: Stage,
    pub attempted: usize,
    pub rewritten: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl StageSummary {
    pub const fn new(stage: Stage) -> Self {
        Self {
            stage,
            attempted: 0,
            rewritten: 0,
            unchanged: 0,
            failed: 0,
        }
    }
}

impl fmt::Display for StageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let done = match self.stage {
            Stage::Sitemap => "written",
            Stage::PermissionFix => "applied",
            _ => "rewritten",
        };
        write!(
            f,
            "{}: {} {done}",
            plural_count(self.attempted, self.stage.unit()),
            self.rewritten
        )?;
        if self.unchanged > 0 {
            write!(f, ", {} unchanged", self.unchanged)?;
        }
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        Ok(())
    }
}

// ============================================================================
// Transform stage
// ============================================================================

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileResult {
    Rewritten,
    Unchanged,
    Failed,
}

/// Everything a transform stage needs.
pub struct TransformStage<'a> {
    pub stage: Stage,
    pub root: &'a Path,
    pub transform: &'a dyn Transform,
    pub handler: DiagnosticHandler,
    pub reporter: &'a dyn Reporter,
}

impl TransformStage<'_> {
    /// Transform every file in parallel and write results back in place.
    ///
    /// A failing file is reported through the stage's handler and left as it
    /// was; the other files are unaffected.
    pub fn run(&self, files: &[PathBuf]) -> StageSummary {
        let results: Vec<FileResult> = files.par_iter().map(|path| self.process(path)).collect();

        let mut summary = StageSummary::new(self.stage);
        summary.attempted = files.len();
        for result in results {
            match result {
                FileResult::Rewritten => summary.rewritten += 1,
                FileResult::Unchanged => summary.unchanged += 1,
                FileResult::Failed => summary.failed += 1,
            }
        }
        summary
    }

    fn process(&self, path: &Path) -> FileResult {
        match self.apply(path) {
            Ok(Outcome::Rewritten(_)) => {
                debug!(self.stage.name(); "{}", root_relative(self.root, path));
                FileResult::Rewritten
            }
            Ok(Outcome::Unchanged) => FileResult::Unchanged,
            Err(err) => {
                debug!(self.stage.name(); "{}: {err}", root_relative(self.root, path));
                self.reporter.emit(&(self.handler)(self.root, path, &err));
                FileResult::Failed
            }
        }
    }

    fn apply(&self, path: &Path) -> Result<Outcome, TransformError> {
        let source = fs::read(path)?;
        let outcome = self.transform.apply(path, &source)?;
        if let Outcome::Rewritten(bytes) = &outcome {
            write_in_place(path, bytes)?;
        }
        Ok(outcome)
    }
}
