//! Stateful overlay file handle
//!
//! [`OverlayFile`] wraps the free functions for callers that want a
//! success flag plus an error message instead of a `Result`.

use std::marker::PhantomData;
use std::path::Path;

use super::format::{ContainerOverlayFormat, OverlayFormat, TileOverlayFormat};
use super::model::Overlay;
use super::options::WriteOptions;
use super::reader::read_overlays;
use super::tiles::{TileNames, TilesetTileNames};
use super::writer::write_overlays;

/// Reads and writes one kind of overlay file.
pub struct OverlayFile<F: OverlayFormat> {
    names: Box<dyn TileNames>,
    options: WriteOptions,
    overlays: Vec<Overlay<F::Entry>>,
    error: String,
    format: PhantomData<F>,
}

/// Handle for `ContainerOverlays.lua`.
pub type ContainerOverlayFile = OverlayFile<ContainerOverlayFormat>;

/// Handle for `TileOverlays.lua`.
pub type TileOverlayFile = OverlayFile<TileOverlayFormat>;

impl<F: OverlayFormat> Default for OverlayFile<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: OverlayFormat> OverlayFile<F> {
    /// Create a handle using [`TilesetTileNames`] and default write options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tile_names(TilesetTileNames::new())
    }

    /// Create a handle using a caller-supplied tile catalog.
    #[must_use]
    pub fn with_tile_names(names: impl TileNames + 'static) -> Self {
        Self {
            names: Box::new(names),
            options: WriteOptions::default(),
            overlays: Vec::new(),
            error: String::new(),
            format: PhantomData,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Read `path`, replacing any overlays held from a previous read.
    ///
    /// Returns `false` on failure; [`error_string`](Self::error_string) then
    /// describes the problem and no overlays are held.
    pub fn read<P: AsRef<Path>>(&mut self, path: P) -> bool {
        self.overlays.clear();
        match read_overlays::<F, _>(path.as_ref(), self.names.as_ref()) {
            Ok(overlays) => {
                self.overlays = overlays;
                self.error.clear();
                true
            }
            Err(err) => {
                self.error = format!("{}: {err}", path.as_ref().display());
                false
            }
        }
    }

    /// Description of the last failure, empty after a success.
    #[must_use]
    pub fn error_string(&self) -> &str {
        &self.error
    }

    /// Overlays from the last successful read.
    #[must_use]
    pub fn overlays(&self) -> &[Overlay<F::Entry>] {
        &self.overlays
    }

    /// Move the overlays out, leaving the handle empty.
    pub fn take_overlays(&mut self) -> Vec<Overlay<F::Entry>> {
        std::mem::take(&mut self.overlays)
    }

    /// Write `overlays` to `path` atomically. Returns `false` on failure.
    pub fn write<P: AsRef<Path>>(&mut self, path: P, overlays: &[Overlay<F::Entry>]) -> bool {
        match write_overlays::<F, _>(path.as_ref(), overlays, self.names.as_ref(), &self.options) {
            Ok(()) => {
                self.error.clear();
                true
            }
            Err(err) => {
                self.error = err.to_string();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::model::{ContainerOverlayEntry, OverlayEntry, TileOverlayEntry};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_read_failure_leaves_no_overlays() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ContainerOverlays.lua");
        fs::write(&path, r#"return { VERSION = 1, a_1 = { { name = "ok", tiles = {} } } }"#).unwrap();

        let mut file = ContainerOverlayFile::new();
        assert!(file.read(&path), "{}", file.error_string());
        assert_eq!(file.overlays().len(), 1);

        fs::write(&path, "return { VERSION = 7 }").unwrap();
        assert!(!file.read(&path));
        assert!(file.error_string().contains("unknown overlay file version: 7"));
        assert!(file.take_overlays().is_empty());
    }

    #[test]
    fn test_missing_fields_clear_previous_overlays() {
        const GOOD: &str = r#"return { VERSION = 1, a_1 = { { name = "ok", tiles = {} } } }"#;
        let dir = tempdir().unwrap();
        let path = dir.path().join("ContainerOverlays.lua");
        let mut file = ContainerOverlayFile::new();

        for (broken, field) in [
            (r#"return { VERSION = 1, a_1 = { { name = "ok" } } }"#, "'tiles'"),
            (r#"return { VERSION = 1, a_1 = { { tiles = {} } } }"#, "'name'"),
        ] {
            fs::write(&path, GOOD).unwrap();
            assert!(file.read(&path), "{}", file.error_string());
            assert_eq!(file.overlays().len(), 1);

            fs::write(&path, broken).unwrap();
            assert!(!file.read(&path));
            assert!(file.error_string().contains(field), "{}", file.error_string());
            assert!(file.take_overlays().is_empty());
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let mut file = TileOverlayFile::new();
        assert!(!file.read(dir.path().join("TileOverlays.lua")));
        assert!(!file.error_string().is_empty());
    }

    #[test]
    fn test_take_overlays_is_one_shot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("TileOverlays.lua");
        let overlays = vec![Overlay::with_entries(
            "floors_1",
            vec![TileOverlayEntry::new("kitchen", vec!["grime_1".to_string()]).with_chance(2)],
        )];

        let mut file = TileOverlayFile::new();
        assert!(file.write(&path, &overlays), "{}", file.error_string());
        assert!(file.read(&path), "{}", file.error_string());

        assert_eq!(file.take_overlays(), overlays);
        assert!(file.take_overlays().is_empty());
    }

    #[test]
    fn test_write_failure_reports_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("ContainerOverlays.lua");
        let overlays = vec![Overlay::with_entries(
            "door_1",
            vec![ContainerOverlayEntry::new("shop", vec!["wood_1".to_string()])],
        )];

        let mut file = ContainerOverlayFile::new().with_options(WriteOptions::new().with_backup(false));
        assert!(!file.write(&path, &overlays));
        assert!(file.error_string().contains("temporary file"));
        assert_eq!(overlays[0].entries()[0].room_name(), "shop");
    }
}
