//! Container and tile overlay files
//!
//! An overlay maps a base tile to per-room lists of replacement tiles. Two
//! variants exist: container overlays (`ContainerOverlays.lua`) and tile
//! overlays (`TileOverlays.lua`, which add a `chance` weight per entry).
//!
//! # Example
//!
//! ```no_run
//! use overlaykit::overlay::{ContainerOverlayFormat, TilesetTileNames, WriteOptions};
//! use overlaykit::overlay::{read_overlays, write_overlays};
//!
//! let names = TilesetTileNames::new();
//! let overlays = read_overlays::<ContainerOverlayFormat, _>("ContainerOverlays.lua", &names)?;
//! write_overlays::<ContainerOverlayFormat, _>(
//!     "ContainerOverlays.lua",
//!     &overlays,
//!     &names,
//!     &WriteOptions::new(),
//! )?;
//! # Ok::<(), overlaykit::Error>(())
//! ```

mod batch;
pub mod commit;
mod file;
mod format;
mod model;
mod options;
mod reader;
mod tiles;
mod writer;

pub use batch::{BatchCheckResult, CheckSummary, check_file, check_files, find_overlay_files};
pub use file::{ContainerOverlayFile, OverlayFile, TileOverlayFile};
pub use format::{ContainerOverlayFormat, OVERLAY_MAP, OverlayFormat, OverlayKind, TileOverlayFormat};
pub use model::{
    CONTAINER_MIN_TILES, ContainerOverlay, ContainerOverlayEntry, DEFAULT_CHANCE, NO_TILE, Overlay,
    OverlayEntry, TileOverlay, TileOverlayEntry,
};
pub use options::{DEFAULT_GENERATOR, WriteOptions};
pub use reader::{CURRENT_VERSION, VERSION_KEY, decode_overlays, parse_overlays, read_overlays};
pub use tiles::{TileNames, TilesetTileNames};
pub use writer::{serialize_overlays, write_overlays};
