//! Error types for `OverlayKit`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `OverlayKit` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Lua Script Errors ====================
    /// The script could not be tokenized or parsed.
    #[error("{line}:{column}: {message}")]
    LuaSyntax {
        /// 1-based line of the offending token.
        line: usize,
        /// 1-based column of the offending token.
        column: usize,
        /// What went wrong.
        message: String,
    },

    /// The script parsed but failed while being evaluated.
    #[error("runtime error: {0}")]
    LuaRuntime(String),

    /// The script did not produce a table to read overlays from.
    #[error("script did not return a table")]
    NoTableReturned,

    // ==================== Overlay Schema Errors ====================
    /// The `VERSION` field holds a value this reader does not understand.
    #[error("unknown overlay file version: {0}")]
    UnknownVersion(String),

    /// A V1 entry object lacks a required field.
    #[error("overlay '{overlay}': entry is missing '{field}'")]
    MissingField {
        /// Tile name of the overlay being decoded.
        overlay: String,
        /// Name of the missing field (`name` or `tiles`).
        field: &'static str,
    },

    /// A table was expected but a string was found.
    #[error("expected a table: {context}")]
    ExpectedTable {
        /// Where the table was expected.
        context: String,
    },

    /// A string was expected but a table was found.
    #[error("expected a string: {context}")]
    ExpectedString {
        /// Where the string was expected.
        context: String,
    },

    /// The `chance` field of a tile overlay entry is not an integer.
    #[error("overlay '{overlay}': invalid chance '{value}'")]
    InvalidChance {
        /// Tile name of the overlay being decoded.
        overlay: String,
        /// The raw field value.
        value: String,
    },

    // ==================== Commit Errors ====================
    /// The temporary file could not be created next to the destination.
    #[error("failed to create a temporary file in {dir}: {source}")]
    TempFileCreate {
        /// Directory the temporary file was created in.
        dir: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Writing to the temporary file failed.
    #[error("failed to write temporary file {path}: {source}")]
    TempFileWrite {
        /// Path of the temporary file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Moving the previous file aside to its `.bak` name failed.
    #[error("failed to back up {from} to {to} (new content kept in {temp}): {source}")]
    BackupFailed {
        /// Existing destination file.
        from: PathBuf,
        /// Backup path.
        to: PathBuf,
        /// Temporary file holding the new content, left on disk.
        temp: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Renaming the temporary file onto the destination failed.
    #[error("failed to move {from} into place at {to}: {source}")]
    CommitFailed {
        /// Temporary file, left on disk.
        from: PathBuf,
        /// Destination path.
        to: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    // ==================== File System Errors ====================
    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDirError(String),
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDirError(err.to_string())
    }
}

/// A specialized Result type for `OverlayKit` operations.
pub type Result<T> = std::result::Result<T, Error>;
