//! Path normalization and in-place file writes.
//!
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `expand_path` - tilde expansion, resolved against a base directory
//! - `root_relative` - display form of a path below the working tree
//! - `write_in_place` - replace a file's bytes without a partially written state

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Expand `~` and resolve a relative path against `base`.
///
/// Always returns an absolute path.
pub fn expand_path(path: &Path, base: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let path = PathBuf::from(expanded);
    let full_path = if path.is_relative() {
        base.join(&path)
    } else {
        path
    };
    normalize_path(&full_path)
}

/// Render `path` relative to the working tree `root`, using `/` separators.
///
/// Never returns an absolute location. When `path` is not below `root`,
/// the part after the last component named like the root is used
/// (`/tmp/x/build/app.js` with root `build` gives `app.js`), and as a last
/// resort only the file name.
pub fn root_relative(root: &Path, path: &Path) -> String {
    if let Ok(rel) = path.strip_prefix(root) {
        return join_components(rel);
    }

    if let Some(root_name) = root.file_name() {
        let components: Vec<_> = path.components().collect();
        if let Some(pos) = components
            .iter()
            .rposition(|c| matches!(c, Component::Normal(name) if *name == root_name))
        {
            let rel: PathBuf = components[pos + 1..].iter().collect();
            if !rel.as_os_str().is_empty() {
                return join_components(&rel);
            }
        }
    }

    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn join_components(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace the contents of `path` with `bytes`.
///
/// Writes a sibling temp file first and renames it over the target, so a
/// failed write leaves the original untouched. The original permissions are
/// carried over.
pub fn write_in_place(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let tmp = path.with_file_name(format!(".{}.sitepress-tmp", file_name.to_string_lossy()));

    let permissions = fs::metadata(path)?.permissions();
    let result = fs::write(&tmp, bytes)
        .and_then(|()| fs::set_permissions(&tmp, permissions))
        .and_then(|()| fs::rename(&tmp, path));

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
