use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::overlay::{DEFAULT_GENERATOR, OverlayKind};

mod execute;

pub mod check;
pub mod dump;
pub mod upgrade;

/// Overlay variant selection for commands that read files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Detect from the file name (`TileOverlays*.lua` is a tile overlay)
    #[default]
    Auto,
    /// Container overlays
    Container,
    /// Tile overlays
    Tile,
}

impl KindArg {
    /// The forced kind, or `None` to detect per file.
    #[must_use]
    pub fn forced(self) -> Option<OverlayKind> {
        match self {
            KindArg::Auto => None,
            KindArg::Container => Some(OverlayKind::Container),
            KindArg::Tile => Some(OverlayKind::Tile),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse overlay files and report problems
    Check {
        /// Overlay files or directories containing them
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Overlay variant
        #[arg(short, long, value_enum, default_value_t = KindArg::Auto)]
        kind: KindArg,

        /// Only print failures
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print the overlays in a file
    Dump {
        /// Overlay file
        path: PathBuf,

        /// Overlay variant
        #[arg(short, long, value_enum, default_value_t = KindArg::Auto)]
        kind: KindArg,

        /// Print as JSON
        #[arg(long)]
        json: bool,

        /// Print the raw Lua table as JSON without decoding overlays
        #[arg(long, conflicts_with = "json")]
        raw: bool,
    },

    /// Rewrite an overlay file (V0 or V1) as canonical V1
    Upgrade {
        /// Overlay file
        path: PathBuf,

        /// Write here instead of replacing the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overlay variant
        #[arg(short, long, value_enum, default_value_t = KindArg::Auto)]
        kind: KindArg,

        /// Do not keep the previous file as `<name>.bak`
        #[arg(long)]
        no_backup: bool,

        /// Tool name recorded in the header comment
        #[arg(long, default_value = DEFAULT_GENERATOR)]
        generator: String,
    },
}
