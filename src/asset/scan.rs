//! Asset selection (read-only, no side effects).
//!
//! Resolves each class's glob patterns against the working tree in a single
//! walk. Patterns are relative to the tree root and use gitignore-style glob
//! syntax, so `**/*.js` matches at any depth. Hidden files and directories
//! are not visited.
//!
//! Only an unreadable root or a bad pattern is fatal. A subdirectory that
//! cannot be read is recorded as a [`WalkIssue`] and the walk goes on.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::overrides::{Override, OverrideBuilder};
use jwalk::{Parallelism, WalkDir};
use thiserror::Error;

use super::AssetClass;

/// Structural selection failures. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("cannot read working tree `{0}`")]
    Root(PathBuf, #[source] std::io::Error),

    #[error("invalid {class} pattern `{pattern}`")]
    Glob {
        class: AssetClass,
        pattern: String,
        #[source]
        source: ignore::Error,
    },
}

/// An entry the walk could not read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkIssue {
    pub path: Option<PathBuf>,
    pub message: String,
}

impl From<jwalk::Error> for WalkIssue {
    fn from(err: jwalk::Error) -> Self {
        let path = err.path().map(Path::to_path_buf);
        // The io error alone; jwalk's own display repeats the absolute path.
        let message = match err.io_error() {
            Some(io) => io.to_string(),
            None => err.to_string(),
        };
        Self { path, message }
    }
}

/// Files per asset class.
#[derive(Debug, Default)]
pub struct Selection {
    files: HashMap<AssetClass, Vec<PathBuf>>,
    issues: Vec<WalkIssue>,
}

impl Selection {
    /// Files matched for `class`, sorted by path.
    pub fn get(&self, class: AssetClass) -> &[PathBuf] {
        self.files.get(&class).map_or(&[], Vec::as_slice)
    }

    /// Total number of selected files across classes.
    pub fn len(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Entries skipped because they could not be read, in walk order.
    pub fn issues(&self) -> &[WalkIssue] {
        &self.issues
    }
}

/// Compiled glob sets for every class, rooted at the working tree.
pub struct AssetSelector {
    root: PathBuf,
    matchers: Vec<(AssetClass, Override)>,
}

impl AssetSelector {
    /// Compile patterns for each class.
    pub fn new<'a>(
        root: &Path,
        patterns: impl IntoIterator<Item = (AssetClass, &'a [String])>,
    ) -> Result<Self, SelectError> {
        let mut matchers = Vec::new();
        for (class, globs) in patterns {
            let mut builder = OverrideBuilder::new(root);
            for pattern in globs {
                builder.add(pattern).map_err(|source| SelectError::Glob {
                    class,
                    pattern: pattern.clone(),
                    source,
                })?;
            }
            let matcher = builder.build().map_err(|source| SelectError::Glob {
                class,
                pattern: globs.join(","),
                source,
            })?;
            matchers.push((class, matcher));
        }
        Ok(Self {
            root: root.to_path_buf(),
            matchers,
        })
    }

    /// Walk the tree once and bucket files by class.
    ///
    /// A file matching several classes is listed under each of them. The walk
    /// runs on the calling thread so it never competes with the stage pool.
    pub fn select(&self) -> Result<Selection, SelectError> {
        fs::read_dir(&self.root).map_err(|e| SelectError::Root(self.root.clone(), e))?;

        let mut selection = Selection::default();
        let walk = WalkDir::new(&self.root)
            .sort(true)
            .parallelism(Parallelism::Serial);
        for entry in walk {
            let mut entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    selection.issues.push(err.into());
                    continue;
                }
            };
            // A directory whose listing failed is still yielded, with the error attached.
            if let Some(err) = entry.read_children_error.take() {
                selection.issues.push(err.into());
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            for (class, matcher) in &self.matchers {
                if matcher.matched(&path, false).is_whitelist() {
                    selection.files.entry(*class).or_default().push(path.clone());
                }
            }
        }

        for files in selection.files.values_mut() {
            files.sort();
        }
        Ok(selection)
    }
}
