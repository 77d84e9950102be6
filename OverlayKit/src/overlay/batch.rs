//! Checking many overlay files at once

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;

use super::format::{ContainerOverlayFormat, OverlayFormat, OverlayKind, TileOverlayFormat};
use super::reader::read_overlays;
use super::tiles::TileNames;

/// Counts from reading one overlay file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSummary {
    pub kind: OverlayKind,
    pub overlays: usize,
    pub entries: usize,
}

/// Result of a batch check
#[derive(Debug, Clone, Default)]
pub struct BatchCheckResult {
    /// Number of files that read cleanly
    pub success_count: usize,
    /// Number of files that failed
    pub fail_count: usize,
    /// One message per file processed
    pub results: Vec<String>,
}

/// Find `.lua` files under `dir`, sorted
///
/// # Errors
///
/// Returns [`crate::Error::WalkDirError`] if a directory cannot be traversed.
pub fn find_overlay_files<P: AsRef<Path>>(dir: P, recursive: bool) -> Result<Vec<PathBuf>> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).max_depth(max_depth) {
        let entry = entry?;
        let is_lua = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("lua"));
        if entry.file_type().is_file() && is_lua {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Read one file, detecting its kind from the file name unless `kind` is given
///
/// # Errors
///
/// Returns any error from [`read_overlays`].
pub fn check_file(
    path: &Path,
    kind: Option<OverlayKind>,
    names: &dyn TileNames,
) -> Result<CheckSummary> {
    match kind.unwrap_or_else(|| OverlayKind::detect(path)) {
        OverlayKind::Container => summarize::<ContainerOverlayFormat>(path, names),
        OverlayKind::Tile => summarize::<TileOverlayFormat>(path, names),
    }
}

fn summarize<F: OverlayFormat>(path: &Path, names: &dyn TileNames) -> Result<CheckSummary> {
    let overlays = read_overlays::<F, _>(path, names)?;
    Ok(CheckSummary {
        kind: F::KIND,
        overlays: overlays.len(),
        entries: overlays.iter().map(super::model::Overlay::len).sum(),
    })
}

/// Check every file, continuing past failures.
pub fn check_files(
    paths: &[PathBuf],
    kind: Option<OverlayKind>,
    names: &dyn TileNames,
) -> BatchCheckResult {
    let mut result = BatchCheckResult::default();
    for path in paths {
        match check_file(path, kind, names) {
            Ok(summary) => {
                result.success_count += 1;
                result.results.push(format!(
                    "OK {}: {} {} overlays, {} entries",
                    path.display(),
                    summary.overlays,
                    summary.kind,
                    summary.entries
                ));
            }
            Err(err) => {
                tracing::warn!("{}: {err}", path.display());
                result.fail_count += 1;
                result.results.push(format!("FAIL {}: {err}", path.display()));
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::tiles::TilesetTileNames;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_find_overlay_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.lua"), "").unwrap();
        fs::write(dir.path().join("a.LUA"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(dir.path().join("nested").join("c.lua"), "").unwrap();

        let shallow = find_overlay_files(dir.path(), false).unwrap();
        assert_eq!(shallow.len(), 2);
        assert!(shallow[0].ends_with("a.LUA"));

        let deep = find_overlay_files(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn test_check_files_counts_failures() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("TileOverlays.lua");
        let bad = dir.path().join("ContainerOverlays.lua");
        fs::write(
            &good,
            r#"return { VERSION = 1, f_1 = { { name = "a", tiles = { "g_1" } }, { name = "b", tiles = {} } } }"#,
        )
        .unwrap();
        fs::write(&bad, "return { VERSION = 1, f_1 = { { tiles = {} } } }").unwrap();

        let result = check_files(&[good, bad], None, &TilesetTileNames::new());
        assert_eq!(result.success_count, 1);
        assert_eq!(result.fail_count, 1);
        assert!(result.results[0].contains("1 tile overlays, 2 entries"));
        assert!(result.results[1].starts_with("FAIL"));
    }
}
