//! CLI command for validating overlay files

use std::path::PathBuf;

use crate::overlay::{OverlayKind, TilesetTileNames, check_files, find_overlay_files};

/// Check files and directories, failing if any file does not read cleanly
pub fn execute(
    paths: &[PathBuf],
    recursive: bool,
    kind: Option<OverlayKind>,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(find_overlay_files(path, recursive)?);
        } else {
            files.push(path.clone());
        }
    }

    if files.is_empty() {
        anyhow::bail!("No .lua files found");
    }

    let result = check_files(&files, kind, &TilesetTileNames::new());
    for line in &result.results {
        if !quiet || line.starts_with("FAIL") {
            println!("{line}");
        }
    }

    if !quiet {
        println!(
            "\n{} ok, {} failed",
            result.success_count, result.fail_count
        );
    }

    if result.fail_count > 0 {
        anyhow::bail!("{} of {} files failed", result.fail_count, files.len());
    }
    Ok(())
}
