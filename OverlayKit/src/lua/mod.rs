//! Lua table-literal reader
//!
//! Overlay files are Lua scripts that build one table and `return` it. This
//! module reads that restricted subset without embedding an interpreter:
//! the script is tokenized, parsed, and evaluated in a sandbox that has no
//! functions, then the resulting table is walked into a [`LuaTable`].

mod eval;
mod lexer;
mod parser;
mod table;

pub use eval::EDITOR_SENTINEL;
pub use table::{LuaTable, LuaTableKeyValue, LuaValue};

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use eval::{Interpreter, Value};
use lexer::Lexer;
use parser::Parser;

/// Options for [`parse_file`] and [`parse_str`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Global to read when the script returns nothing.
    ///
    /// Older container overlay files assign a global `overlayMap` instead of
    /// returning it. `None` makes a missing `return` an error.
    pub global_fallback: Option<String>,
}

impl ParseOptions {
    /// Create options that require a returned table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global to fall back to when nothing is returned.
    #[must_use]
    pub fn with_global_fallback(mut self, name: impl Into<String>) -> Self {
        self.global_fallback = Some(name.into());
        self
    }
}

/// Read a Lua file from disk and extract the table it produces
///
/// Files that are not valid UTF-8 are decoded as Latin-1.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, [`Error::LuaSyntax`] or
/// [`Error::LuaRuntime`] if the script is malformed or fails, and
/// [`Error::NoTableReturned`] if it produces no table.
pub fn parse_file<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<LuaTable> {
    let bytes = fs::read(path.as_ref())?;
    let source = decode_source(bytes);
    tracing::debug!("Parsing {} ({} bytes)", path.as_ref().display(), source.len());
    parse_str(&source, options)
}

/// Run a Lua chunk and extract the table it produces
///
/// # Errors
///
/// Returns [`Error::LuaSyntax`], [`Error::LuaRuntime`], or
/// [`Error::NoTableReturned`].
pub fn parse_str(source: &str, options: &ParseOptions) -> Result<LuaTable> {
    let tokens = Lexer::new(source).tokenize()?;
    let chunk = Parser::new(tokens).parse_chunk()?;

    // Lives for exactly this call; its tables are freed on every path out.
    let mut interpreter = Interpreter::new();
    let returned = interpreter.run(&chunk)?;

    let value = match (returned, &options.global_fallback) {
        (Value::Table(id), _) => Value::Table(id),
        (Value::Nil, Some(global)) => interpreter.global(global),
        (other, _) => other,
    };

    match value {
        Value::Table(id) => interpreter.to_lua_table(id),
        _ => Err(Error::NoTableReturned),
    }
}

fn decode_source(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text),
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returned_table() {
        let table = parse_str(
            "local overlayMap = {}\noverlayMap.VERSION = 1\noverlayMap[\"door_1\"] = {{ name = \"shop\", tiles = {\"wood_1\",\"wood_2\"} }}\nreturn overlayMap",
            &ParseOptions::new(),
        )
        .unwrap();

        assert_eq!(table.get_string("VERSION"), Some("1"));
        let entry = table.get_table("door_1").and_then(|t| t.get_table("1")).unwrap();
        assert_eq!(entry.get_string("name"), Some("shop"));
        let tiles: Vec<_> = entry
            .get_table("tiles")
            .unwrap()
            .iter()
            .filter_map(LuaTableKeyValue::as_str)
            .collect();
        assert_eq!(tiles, ["wood_1", "wood_2"]);
    }

    #[test]
    fn test_missing_return_is_error_without_fallback() {
        let err = parse_str("overlayMap = {}", &ParseOptions::new()).unwrap_err();
        assert!(matches!(err, Error::NoTableReturned));
    }

    #[test]
    fn test_global_fallback() {
        let options = ParseOptions::new().with_global_fallback("overlayMap");
        let table = parse_str("overlayMap = {}\noverlayMap.a = { x = { 'none' } }", &options).unwrap();
        assert!(table.get_table("a").is_some());
    }

    #[test]
    fn test_returned_scalar_is_not_a_table() {
        let err = parse_str("return 5", &ParseOptions::new()).unwrap_err();
        assert!(matches!(err, Error::NoTableReturned));
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let err = parse_str("local t = {\n  a = ,\n}", &ParseOptions::new()).unwrap_err();
        assert!(matches!(err, Error::LuaSyntax { line: 2, .. }), "{err}");
    }

    #[test]
    fn test_deeply_nested_tables_are_a_syntax_error() {
        let source = format!("return {}{}", "{".repeat(10_000), "}".repeat(10_000));
        let err = parse_str(&source, &ParseOptions::new()).unwrap_err();
        assert!(matches!(err, Error::LuaSyntax { .. }), "{err}");
        assert!(err.to_string().contains("too many syntax levels"), "{err}");
    }

    #[test]
    fn test_latin1_fallback() {
        let text = decode_source(b"-- caf\xe9\nreturn {}".to_vec());
        assert!(text.starts_with("-- caf\u{e9}"));
        assert!(parse_str(&text, &ParseOptions::new()).is_ok());
    }
}
