//! CLI command for printing overlay files

use std::path::Path;

use crate::lua;
use crate::overlay::{
    ContainerOverlayFormat, Overlay, OverlayEntry, OverlayFormat, OverlayKind, TileOverlayFormat,
    TilesetTileNames, read_overlays,
};

/// Print the overlays in `path` as text, JSON, or the undecoded table
pub fn execute(path: &Path, kind: Option<OverlayKind>, json: bool, raw: bool) -> anyhow::Result<()> {
    match kind.unwrap_or_else(|| OverlayKind::detect(path)) {
        OverlayKind::Container => dump::<ContainerOverlayFormat>(path, json, raw),
        OverlayKind::Tile => dump::<TileOverlayFormat>(path, json, raw),
    }
}

fn dump<F>(path: &Path, json: bool, raw: bool) -> anyhow::Result<()>
where
    F: OverlayFormat,
    F::Entry: serde::Serialize,
{
    if raw {
        let table = lua::parse_file(path, &F::parse_options())?;
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    let overlays = read_overlays::<F, _>(path, &TilesetTileNames::new())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&overlays)?);
    } else {
        print_overlays(&overlays);
    }
    Ok(())
}

fn print_overlays<E: OverlayEntry>(overlays: &[Overlay<E>]) {
    for overlay in overlays {
        println!("{}", overlay.tile_name);
        for entry in overlay.entries() {
            println!("  {:<24} {}", entry.room_name(), entry.tiles().join(", "));
            if !entry.usage().is_empty() {
                println!("    usage: {}", entry.usage());
            }
        }
    }
    println!("\n{} overlays", overlays.len());
}
