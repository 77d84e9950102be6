//! Overlay file writing
//!
//! The writer only produces the V1 schema. Output is deterministic: overlays
//! are ordered by short tile name and entries by room name.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use crate::error::Result;

use super::commit;
use super::format::{OVERLAY_MAP, OverlayFormat};
use super::model::{NO_TILE, Overlay, OverlayEntry};
use super::options::WriteOptions;
use super::reader::{CURRENT_VERSION, VERSION_KEY};
use super::tiles::TileNames;

/// Write overlays to disk as a V1 script
///
/// The file is replaced atomically; see [`commit::commit_file`].
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created or written, or if
/// the backup or final rename fails.
pub fn write_overlays<F, P>(
    path: P,
    overlays: &[Overlay<F::Entry>],
    names: &dyn TileNames,
    options: &WriteOptions,
) -> Result<()>
where
    F: OverlayFormat,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = serialize_overlays::<F>(overlays, names, options);
    commit::commit_file(path, &content, options.backup)?;
    tracing::info!("Wrote {} {} overlays to {}", overlays.len(), F::KIND, path.display());
    Ok(())
}

/// Serialize overlays to V1 script text.
#[must_use]
pub fn serialize_overlays<F: OverlayFormat>(
    overlays: &[Overlay<F::Entry>],
    names: &dyn TileNames,
    options: &WriteOptions,
) -> String {
    let mut by_name: BTreeMap<String, &Overlay<F::Entry>> = BTreeMap::new();
    for overlay in overlays {
        let short = names.short_name(&overlay.tile_name);
        if let Some(previous) = by_name.insert(short.clone(), overlay) {
            tracing::warn!(
                "Overlays '{}' and '{}' share the name '{short}', keeping the last",
                previous.tile_name,
                overlay.tile_name
            );
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "-- THIS FILE WAS AUTOMATICALLY GENERATED BY {}", options.generator);
    let _ = writeln!(out, "local {OVERLAY_MAP} = {{}}");
    let _ = writeln!(out, "{OVERLAY_MAP}.{VERSION_KEY} = {CURRENT_VERSION}");

    for (short, overlay) in &by_name {
        let mut entries: Vec<&F::Entry> = overlay.entries().iter().collect();
        entries.sort_by(|a, b| a.room_name().cmp(b.room_name()));

        let objects: Vec<String> = entries
            .into_iter()
            .map(|entry| entry_literal::<F>(entry, names))
            .collect();
        let _ = writeln!(
            out,
            "{OVERLAY_MAP}[{}] = {{{}}}",
            quote(short),
            objects.join(", ")
        );
    }

    out.push('\n');
    out.push_str("if not TILEZED then\n");
    let _ = writeln!(out, "    {}():addOverlays({OVERLAY_MAP})", F::REGISTRY);
    out.push_str("end\n\n");
    let _ = writeln!(out, "return {OVERLAY_MAP}");
    out
}

fn entry_literal<F: OverlayFormat>(entry: &F::Entry, names: &dyn TileNames) -> String {
    let mut out = format!("{{ name = {}, ", quote(entry.room_name()));
    F::write_extra_fields(entry, &mut out);
    if !entry.usage().is_empty() {
        let _ = write!(out, "usage = {}, ", quote(entry.usage()));
    }
    let tiles: Vec<String> = emitted_tiles(entry.tiles(), names)
        .iter()
        .map(String::as_str)
        .map(quote)
        .collect();
    let _ = write!(out, "tiles = {{{}}} }}", tiles.join(", "));
    out
}

/// Short names to write for one entry.
///
/// Empty names are dropped, and a [`NO_TILE`] is dropped once anything has
/// been emitted before it.
fn emitted_tiles(tiles: &[String], names: &dyn TileNames) -> Vec<String> {
    let mut emitted: Vec<String> = Vec::with_capacity(tiles.len());
    for tile in tiles {
        if tile.is_empty() || (tile == NO_TILE && !emitted.is_empty()) {
            continue;
        }
        emitted.push(names.short_name(tile));
    }
    emitted
}

/// Double-quoted Lua string literal.
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\{:03}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::format::{ContainerOverlayFormat, TileOverlayFormat};
    use crate::overlay::model::{ContainerOverlayEntry, TileOverlayEntry};
    use crate::overlay::tiles::TilesetTileNames;
    use pretty_assertions::assert_eq;

    fn tiles(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn emitted(list: &[&str]) -> Vec<String> {
        emitted_tiles(&tiles(list), &TilesetTileNames::new())
    }

    #[test]
    fn test_door_example_output() {
        let overlay = Overlay::with_entries(
            "door_1",
            vec![ContainerOverlayEntry::new("shop", tiles(&["wood_1", "wood_2"]))],
        );
        let text = serialize_overlays::<ContainerOverlayFormat>(
            &[overlay],
            &TilesetTileNames::new(),
            &WriteOptions::new(),
        );

        let expected = "\
-- THIS FILE WAS AUTOMATICALLY GENERATED BY OverlayKit
local overlayMap = {}
overlayMap.VERSION = 1
overlayMap[\"door_1\"] = {{ name = \"shop\", tiles = {\"wood_1\", \"wood_2\"} }}

if not TILEZED then
    getContainerOverlays():addOverlays(overlayMap)
end

return overlayMap
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_tile_overlay_fields_and_ordering() {
        let overlays = vec![
            Overlay::with_entries(
                "walls_02",
                vec![
                    TileOverlayEntry::new("kitchen", tiles(&["grime_1"])).with_chance(3),
                    TileOverlayEntry {
                        usage: "near \"tubs\"".to_string(),
                        ..TileOverlayEntry::new("bathroom", tiles(&["grime_02"]))
                    },
                ],
            ),
            Overlay::with_entries("floors_1", vec![TileOverlayEntry::new("bar", tiles(&["x_1"]))]),
        ];
        let options = WriteOptions::new().with_generator("TileZed");
        let text =
            serialize_overlays::<TileOverlayFormat>(&overlays, &TilesetTileNames::new(), &options);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "-- THIS FILE WAS AUTOMATICALLY GENERATED BY TileZed");
        assert_eq!(
            lines[3],
            r#"overlayMap["floors_1"] = {{ name = "bar", chance = 1, tiles = {"x_1"} }}"#
        );
        assert_eq!(
            lines[4],
            r#"overlayMap["walls_2"] = {{ name = "bathroom", chance = 1, usage = "near \"tubs\"", tiles = {"grime_2"} }, { name = "kitchen", chance = 3, tiles = {"grime_1"} }}"#
        );
        assert!(text.contains("getTileOverlays():addOverlays(overlayMap)"));
    }

    #[test]
    fn test_none_after_tile_is_dropped() {
        assert_eq!(emitted(&["a_1", "none"]), ["a_1"]);
    }

    #[test]
    fn test_leading_none_is_kept() {
        assert_eq!(emitted(&["none", "none"]), ["none"]);
        assert_eq!(emitted(&["none", "a_1"]), ["none", "a_1"]);
    }

    #[test]
    fn test_empty_names_are_dropped() {
        assert_eq!(emitted(&["", "a_01", ""]), ["a_1"]);
        assert!(emitted(&[]).is_empty());
    }

    #[test]
    fn test_colliding_short_names_keep_last() {
        let overlays = vec![
            Overlay::with_entries("a_01", vec![ContainerOverlayEntry::new("first", tiles(&["x_1"]))]),
            Overlay::with_entries("a_1", vec![ContainerOverlayEntry::new("second", tiles(&["x_1"]))]),
        ];
        let text = serialize_overlays::<ContainerOverlayFormat>(
            &overlays,
            &TilesetTileNames::new(),
            &WriteOptions::new(),
        );
        assert!(text.contains("\"second\""));
        assert!(!text.contains("\"first\""));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("a\\b\"c\n"), r#""a\\b\"c\n""#);
        assert_eq!(quote("\u{1}"), r#""\001""#);
        assert_eq!(quote("café"), "\"café\"");
    }
}
