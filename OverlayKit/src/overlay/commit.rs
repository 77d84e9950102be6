//! Atomic file replacement
//!
//! New content goes to a temporary file in the destination directory. The
//! previous file (if any) is moved to `<path>.bak`, then the temporary file is
//! renamed over the destination. A failed commit leaves the temporary file on
//! disk and reports its path.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// `<path>.bak`
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

/// Atomically replace `path` with `content`
///
/// # Errors
///
/// Returns [`Error::TempFileCreate`] or [`Error::TempFileWrite`] if the new
/// content cannot be staged, [`Error::BackupFailed`] if the existing file
/// cannot be moved aside, and [`Error::CommitFailed`] if the final rename fails.
pub fn commit_file(path: &Path, content: &str, backup: bool) -> Result<()> {
    commit_with(path, content, backup, rename_file)
}

fn commit_with<R>(path: &Path, content: &str, backup: bool, mut rename: R) -> Result<()>
where
    R: FnMut(&Path, &Path) -> io::Result<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(dir).map_err(|source| Error::TempFileCreate {
        dir: dir.to_path_buf(),
        source,
    })?;
    write_synced(&mut temp, content).map_err(|source| Error::TempFileWrite {
        path: temp.path().to_path_buf(),
        source,
    })?;
    // New temp files are private; the replacement keeps the destination's mode.
    if let Ok(meta) = fs::metadata(path) {
        temp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|source| Error::TempFileWrite {
                path: temp.path().to_path_buf(),
                source,
            })?;
    }
    let temp = temp.into_temp_path().keep().map_err(|err| Error::TempFileWrite {
        path: err.path.to_path_buf(),
        source: err.error,
    })?;
    tracing::debug!("Staged {} bytes in {}", content.len(), temp.display());

    let bak = backup_path(path);
    let backed_up = backup && path.exists();
    if backed_up {
        move_aside(path, &bak, &mut rename).map_err(|source| Error::BackupFailed {
            from: path.to_path_buf(),
            to: bak.clone(),
            temp: temp.clone(),
            source,
        })?;
    }

    if let Err(source) = rename(&temp, path) {
        if backed_up {
            if let Err(err) = rename(&bak, path) {
                tracing::warn!("Could not restore {} from {}: {err}", path.display(), bak.display());
            }
        }
        return Err(Error::CommitFailed {
            from: temp,
            to: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

fn rename_file(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
}

fn write_synced(temp: &mut NamedTempFile, content: &str) -> io::Result<()> {
    temp.write_all(content.as_bytes())?;
    temp.flush()?;
    temp.as_file().sync_all()
}

fn move_aside<R>(path: &Path, bak: &Path, rename: &mut R) -> io::Result<()>
where
    R: FnMut(&Path, &Path) -> io::Result<()>,
{
    match fs::remove_file(bak) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    rename(path, bak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_first_write_has_no_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ContainerOverlays.lua");

        commit_file(&path, "new", true).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!backup_path(&path).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_replacement_keeps_destination_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("ContainerOverlays.lua");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        commit_file(&path, "new", true).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_backup_replaces_previous_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ContainerOverlays.lua");
        fs::write(&path, "old").unwrap();
        fs::write(backup_path(&path), "older").unwrap();

        commit_file(&path, "new", true).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), "old");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_backup_disabled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("TileOverlays.lua");
        fs::write(&path, "old").unwrap();

        commit_file(&path, "new", false).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_failed_commit_restores_destination() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("TileOverlays.lua");
        let bak = backup_path(&path);
        fs::write(&path, "old").unwrap();

        let err = commit_with(&path, "new", true, |from, to| {
            if to == path && from != bak {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            } else {
                fs::rename(from, to)
            }
        })
        .unwrap_err();

        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        assert!(!bak.exists());
        match err {
            Error::CommitFailed { from, to, .. } => {
                assert_eq!(to, path);
                assert_eq!(fs::read_to_string(&from).unwrap(), "new");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failed_backup_keeps_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("TileOverlays.lua");
        fs::write(&path, "old").unwrap();

        let err = commit_with(&path, "new", true, |_, _| Err(io::Error::other("busy"))).unwrap_err();

        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        match err {
            Error::BackupFailed { temp, .. } => {
                assert_eq!(fs::read_to_string(&temp).unwrap(), "new");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_directory_fails_to_stage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("TileOverlays.lua");

        let err = commit_file(&path, "new", true).unwrap_err();
        assert!(matches!(err, Error::TempFileCreate { .. }));
    }
}
