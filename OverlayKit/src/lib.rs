//! # OverlayKit
//!
//! Reading and writing the Lua overlay files used by building editors to
//! decorate map tiles per room.
//!
//! ## Modules
//!
//! - **lua** - Reader for the table-literal subset of Lua the files are written in
//! - **overlay** - Overlay model, V0/V1 decoding, deterministic V1 writer with atomic commit
//!
//! ## Quick Start
//!
//! ```no_run
//! use overlaykit::prelude::*;
//!
//! let mut file = TileOverlayFile::new();
//! if !file.read("media/lua/TileOverlays.lua") {
//!     eprintln!("{}", file.error_string());
//! }
//! let overlays = file.take_overlays();
//! println!("Found {} overlays", overlays.len());
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `overlaykit` command-line binary

pub mod error;
pub mod lua;
pub mod overlay;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::lua::{LuaTable, LuaTableKeyValue, LuaValue, ParseOptions};
    pub use crate::overlay::{
        ContainerOverlay, ContainerOverlayEntry, ContainerOverlayFile, ContainerOverlayFormat,
        Overlay, OverlayEntry, OverlayFile, OverlayFormat, OverlayKind, TileNames, TileOverlay,
        TileOverlayEntry, TileOverlayFile, TileOverlayFormat, TilesetTileNames, WriteOptions,
        read_overlays, write_overlays,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
