//! Permission normalization for sitemap artifacts.

use std::path::{Path, PathBuf};

use crate::debug;
use crate::diagnostic::{Diagnostic, Reporter};
use crate::utils::path::root_relative;

/// Outcome of a permission pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PermissionSummary {
    pub applied: usize,
    pub failed: usize,
}

/// Set `mode` on every artifact. Each failure is reported and skipped.
#[cfg(unix)]
pub fn normalize(
    root: &Path,
    artifacts: &[PathBuf],
    mode: u32,
    reporter: &dyn Reporter,
) -> PermissionSummary {
    use std::fs::{self, Permissions};
    use std::os::unix::fs::PermissionsExt;

    let mut summary = PermissionSummary::default();
    for path in artifacts {
        match fs::set_permissions(path, Permissions::from_mode(mode)) {
            Ok(()) => {
                summary.applied += 1;
                debug!("permission"; "{:o} {}", mode, root_relative(root, path));
            }
            Err(e) => {
                summary.failed += 1;
                reporter.emit(
                    &Diagnostic::new(format!("failed to set permissions: {e}"))
                        .with_path(root, path),
                );
            }
        }
    }
    summary
}

/// Unix permission bits do not exist here; nothing to do.
#[cfg(not(unix))]
pub fn normalize(
    root: &Path,
    artifacts: &[PathBuf],
    mode: u32,
    _reporter: &dyn Reporter,
) -> PermissionSummary {
    for path in artifacts {
        debug!("permission"; "skip {:o} {}", mode, root_relative(root, path));
    }
    PermissionSummary::default()
}
