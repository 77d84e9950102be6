//! The two overlay file variants
//!
//! Container overlays and tile overlays share one wire format and differ
//! only in a few entry fields, the engine registry they hook into, and
//! whether the legacy global-variable form is accepted.

use std::fmt::{self, Write as _};
use std::path::Path;

use crate::error::{Error, Result};
use crate::lua::{LuaTable, ParseOptions};

use super::model::{ContainerOverlayEntry, DEFAULT_CHANCE, OverlayEntry, TileOverlayEntry};

/// Table variable name used by overlay scripts.
pub const OVERLAY_MAP: &str = "overlayMap";

/// Which overlay variant a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Container,
    Tile,
}

impl OverlayKind {
    /// Guesses the variant from a file name: `TileOverlays*.lua` holds tile
    /// overlays, anything else container overlays.
    pub fn detect<P: AsRef<Path>>(path: P) -> Self {
        let is_tile = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .is_some_and(|n| n.starts_with("tileoverlay"));
        if is_tile { Self::Tile } else { Self::Container }
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container => write!(f, "container"),
            Self::Tile => write!(f, "tile"),
        }
    }
}

/// Variant-specific parts of reading and writing an overlay file.
pub trait OverlayFormat {
    type Entry: OverlayEntry + Clone;

    const KIND: OverlayKind;

    /// Engine function whose result receives the overlays, e.g. `getTileOverlays`.
    const REGISTRY: &'static str;

    /// How the script reader should treat a file with no `return`.
    fn parse_options() -> ParseOptions;

    /// Builds an entry from decoded fields.
    ///
    /// `object` is the V1 entry table, `None` for the V0 schema.
    fn build_entry(
        overlay: &str,
        room_name: String,
        tiles: Vec<String>,
        object: Option<&LuaTable>,
    ) -> Result<Self::Entry>;

    /// Writes variant-only fields (each followed by `", "`) into an entry literal.
    fn write_extra_fields(entry: &Self::Entry, out: &mut String);
}

/// `ContainerOverlays.lua`
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerOverlayFormat;

impl OverlayFormat for ContainerOverlayFormat {
    type Entry = ContainerOverlayEntry;

    const KIND: OverlayKind = OverlayKind::Container;
    const REGISTRY: &'static str = "getContainerOverlays";

    fn parse_options() -> ParseOptions {
        ParseOptions::new().with_global_fallback(OVERLAY_MAP)
    }

    fn build_entry(
        _overlay: &str,
        room_name: String,
        tiles: Vec<String>,
        object: Option<&LuaTable>,
    ) -> Result<Self::Entry> {
        let mut entry = ContainerOverlayEntry::new(room_name, tiles);
        if let Some(usage) = object.and_then(|o| o.get_string("usage")) {
            entry.usage = usage.to_string();
        }
        entry.pad_tiles();
        Ok(entry)
    }

    fn write_extra_fields(_entry: &Self::Entry, _out: &mut String) {}
}

/// `TileOverlays.lua`
#[derive(Debug, Clone, Copy, Default)]
pub struct TileOverlayFormat;

impl OverlayFormat for TileOverlayFormat {
    type Entry = TileOverlayEntry;

    const KIND: OverlayKind = OverlayKind::Tile;
    const REGISTRY: &'static str = "getTileOverlays";

    fn parse_options() -> ParseOptions {
        ParseOptions::new()
    }

    fn build_entry(
        overlay: &str,
        room_name: String,
        tiles: Vec<String>,
        object: Option<&LuaTable>,
    ) -> Result<Self::Entry> {
        let mut entry = TileOverlayEntry::new(room_name, tiles);
        let Some(object) = object else {
            return Ok(entry);
        };

        if let Some(usage) = object.get_string("usage") {
            entry.usage = usage.to_string();
        }
        entry.chance = match object.find("chance") {
            None => DEFAULT_CHANCE,
            Some(kv) => kv
                .as_str()
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| Error::InvalidChance {
                    overlay: overlay.to_string(),
                    value: kv.as_str().unwrap_or("<table>").to_string(),
                })?,
        };
        Ok(entry)
    }

    fn write_extra_fields(entry: &Self::Entry, out: &mut String) {
        let _ = write!(out, "chance = {}, ", entry.chance);
    }
}
