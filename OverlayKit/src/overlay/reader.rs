//! Overlay file reading
//!
//! Two table shapes exist on disk:
//!
//! - V0 (no `VERSION` key): `overlayMap[tile][room] = { tile, ... }`
//! - V1 (`VERSION = 1`): `overlayMap[tile] = { { name = room, tiles = { ... } }, ... }`

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::lua::{self, LuaTable, LuaTableKeyValue};

use super::format::OverlayFormat;
use super::model::{NO_TILE, Overlay};
use super::tiles::TileNames;

/// Key holding the schema version.
pub const VERSION_KEY: &str = "VERSION";

/// The only versioned schema this reader knows.
pub const CURRENT_VERSION: &str = "1";

/// Read an overlay file from disk
///
/// Overlays come back sorted by normalized tile name with duplicates
/// collapsed to the last definition.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, a Lua error if the script
/// is malformed, and a schema error ([`Error::UnknownVersion`],
/// [`Error::MissingField`], ...) if the table has the wrong shape.
pub fn read_overlays<F, P>(path: P, names: &dyn TileNames) -> Result<Vec<Overlay<F::Entry>>>
where
    F: OverlayFormat,
    P: AsRef<Path>,
{
    let table = lua::parse_file(path.as_ref(), &F::parse_options())?;
    let overlays = decode_overlays::<F>(&table, names)?;
    tracing::info!(
        "Read {} {} overlays from {}",
        overlays.len(),
        F::KIND,
        path.as_ref().display()
    );
    Ok(overlays)
}

/// Parse overlays from Lua source text
///
/// # Errors
///
/// Same as [`read_overlays`], minus IO.
pub fn parse_overlays<F: OverlayFormat>(
    source: &str,
    names: &dyn TileNames,
) -> Result<Vec<Overlay<F::Entry>>> {
    let table = lua::parse_str(source, &F::parse_options())?;
    decode_overlays::<F>(&table, names)
}

/// Decode an already-parsed table, dispatching on its `VERSION` field
///
/// # Errors
///
/// Returns [`Error::UnknownVersion`] for an unrecognised version and the
/// schema errors of the matching decoder.
pub fn decode_overlays<F: OverlayFormat>(
    table: &LuaTable,
    names: &dyn TileNames,
) -> Result<Vec<Overlay<F::Entry>>> {
    let overlays = match table.find(VERSION_KEY) {
        None => {
            tracing::debug!("No {VERSION_KEY} key, reading legacy schema");
            decode_v0::<F>(table, names)?
        }
        Some(kv) => match kv.as_str() {
            Some(CURRENT_VERSION) => decode_v1::<F>(table, names)?,
            Some(other) => return Err(Error::UnknownVersion(other.to_string())),
            None => return Err(Error::UnknownVersion("<table>".to_string())),
        },
    };
    Ok(overlays.into_values().collect())
}

fn decode_v0<F: OverlayFormat>(
    table: &LuaTable,
    names: &dyn TileNames,
) -> Result<BTreeMap<String, Overlay<F::Entry>>> {
    let mut overlays = BTreeMap::new();

    for kv in table {
        let Some(rooms) = kv.as_table() else {
            continue;
        };
        let tile_name = names.normalize(&kv.key);
        let mut overlay = Overlay::new(tile_name.clone());

        for room in rooms {
            let Some(tiles) = room.as_table() else {
                continue;
            };
            let tiles = read_tile_list(tiles, &tile_name, names)?;
            overlay.push_entry(F::build_entry(&tile_name, room.key.clone(), tiles, None)?);
        }

        insert_overlay(&mut overlays, overlay);
    }

    Ok(overlays)
}

fn decode_v1<F: OverlayFormat>(
    table: &LuaTable,
    names: &dyn TileNames,
) -> Result<BTreeMap<String, Overlay<F::Entry>>> {
    let mut overlays = BTreeMap::new();

    for kv in table {
        if kv.key == VERSION_KEY {
            continue;
        }
        let Some(objects) = kv.as_table() else {
            continue;
        };
        let tile_name = names.normalize(&kv.key);
        let mut overlay = Overlay::new(tile_name.clone());

        for object in objects {
            let object = object.as_table().ok_or_else(|| Error::ExpectedTable {
                context: format!("entry {} of overlay '{tile_name}'", object.key),
            })?;
            let room_name = object.get_string("name").ok_or_else(|| Error::MissingField {
                overlay: tile_name.clone(),
                field: "name",
            })?;
            let tiles = object.get_table("tiles").ok_or_else(|| Error::MissingField {
                overlay: tile_name.clone(),
                field: "tiles",
            })?;
            let tiles = read_tile_list(tiles, &tile_name, names)?;
            overlay.push_entry(F::build_entry(
                &tile_name,
                room_name.to_string(),
                tiles,
                Some(object),
            )?);
        }

        insert_overlay(&mut overlays, overlay);
    }

    Ok(overlays)
}

fn read_tile_list(tiles: &LuaTable, overlay: &str, names: &dyn TileNames) -> Result<Vec<String>> {
    tiles
        .iter()
        .map(|kv: &LuaTableKeyValue| {
            let tile = kv.as_str().ok_or_else(|| Error::ExpectedString {
                context: format!("tile {} of overlay '{overlay}'", kv.key),
            })?;
            Ok(if tile == NO_TILE {
                tile.to_string()
            } else {
                names.normalize(tile)
            })
        })
        .collect()
}

fn insert_overlay<E>(overlays: &mut BTreeMap<String, Overlay<E>>, overlay: Overlay<E>) {
    if let Some(previous) = overlays.insert(overlay.tile_name.clone(), overlay) {
        tracing::warn!("Duplicate overlay '{}', keeping the last definition", previous.tile_name);
    }
}
