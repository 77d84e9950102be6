//! CLI command for rewriting overlay files in the current schema

use std::path::Path;

use crate::overlay::{
    ContainerOverlayFormat, OverlayFormat, OverlayKind, TileOverlayFormat, TilesetTileNames,
    WriteOptions, read_overlays, write_overlays,
};

/// Read `path` in either schema and write it back as V1
pub fn execute(
    path: &Path,
    output: Option<&Path>,
    kind: Option<OverlayKind>,
    backup: bool,
    generator: &str,
) -> anyhow::Result<()> {
    let options = WriteOptions::new()
        .with_generator(generator)
        .with_backup(backup);
    let dest = output.unwrap_or(path);

    match kind.unwrap_or_else(|| OverlayKind::detect(path)) {
        OverlayKind::Container => upgrade::<ContainerOverlayFormat>(path, dest, &options),
        OverlayKind::Tile => upgrade::<TileOverlayFormat>(path, dest, &options),
    }
}

fn upgrade<F: OverlayFormat>(source: &Path, dest: &Path, options: &WriteOptions) -> anyhow::Result<()> {
    let names = TilesetTileNames::new();
    let overlays = read_overlays::<F, _>(source, &names)?;
    write_overlays::<F, _>(dest, &overlays, &names, options)?;

    println!(
        "Wrote {} {} overlays to {}",
        overlays.len(),
        F::KIND,
        dest.display()
    );
    Ok(())
}
