//! Tile name canonicalization
//!
//! Overlay files refer to tiles as `<tileset>_<index>`. The tile catalog that
//! decides what a valid tileset is lives outside this crate; it is reached
//! only through [`TileNames`].

use std::collections::HashSet;

use super::model::NO_TILE;

/// Tile-name operations supplied by the tile catalog.
pub trait TileNames {
    /// Canonical long form of `name`, or `name` unchanged if it cannot be decomposed.
    fn normalize(&self, name: &str) -> String;

    /// Splits `name` into its tileset name and tile index.
    fn parse(&self, name: &str) -> Option<(String, u32)>;

    /// Short `<tileset>_<index>` form written to overlay files.
    ///
    /// [`NO_TILE`] and names that cannot be parsed are returned unchanged.
    fn short_name(&self, name: &str) -> String {
        if name == NO_TILE {
            return name.to_string();
        }
        match self.parse(name) {
            Some((tileset, index)) => format!("{}_{index}", tileset_base_name(&tileset)),
            None => name.to_string(),
        }
    }
}

/// Strips any directory and extension from a tileset file name.
fn tileset_base_name(tileset: &str) -> &str {
    let file = tileset.rsplit(['/', '\\']).next().unwrap_or(tileset);
    match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    }
}

/// Default [`TileNames`]: `<tileset>_<index>` with the index split at the last `_`.
///
/// When constructed with a set of known tilesets, names from other tilesets
/// are treated as undecomposable and pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct TilesetTileNames {
    known_tilesets: HashSet<String>,
}

impl TilesetTileNames {
    /// Accepts any tileset name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts only the given tilesets.
    #[must_use]
    pub fn with_tilesets<I, S>(tilesets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_tilesets: tilesets.into_iter().map(Into::into).collect(),
        }
    }

    fn is_known(&self, tileset: &str) -> bool {
        self.known_tilesets.is_empty() || self.known_tilesets.contains(tileset)
    }
}

impl TileNames for TilesetTileNames {
    fn normalize(&self, name: &str) -> String {
        if name == NO_TILE {
            return name.to_string();
        }
        match self.parse(name) {
            Some((tileset, index)) => format!("{tileset}_{index}"),
            None => name.to_string(),
        }
    }

    fn parse(&self, name: &str) -> Option<(String, u32)> {
        let (tileset, index) = name.rsplit_once('_')?;
        if tileset.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let index: u32 = index.parse().ok()?;
        self.is_known(tileset).then(|| (tileset.to_string(), index))
    }
}
