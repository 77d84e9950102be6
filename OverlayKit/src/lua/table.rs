//! Generic ordered key/value tree
//!
//! The shape overlay files are decoded from: every value is either a string
//! leaf or a nested table. Nothing here knows about Lua syntax.

use serde::Serialize;

/// A value stored under a key: a string leaf or a nested table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LuaValue {
    /// Scalar leaf, already coerced to text.
    String(String),
    /// Nested table, owned by the pair holding it.
    Table(LuaTable),
}

/// One ordered `(key, value)` pair of a [`LuaTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LuaTableKeyValue {
    /// Key, coerced to text (`1`, `2`, ... for sequence elements).
    pub key: String,
    /// The value under `key`.
    pub value: LuaValue,
}

impl LuaTableKeyValue {
    /// Creates a pair holding a string leaf.
    #[must_use]
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: LuaValue::String(value.into()),
        }
    }

    /// Creates a pair holding a nested table.
    #[must_use]
    pub fn table(key: impl Into<String>, table: LuaTable) -> Self {
        Self {
            key: key.into(),
            value: LuaValue::Table(table),
        }
    }

    /// The string leaf, if this pair holds one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            LuaValue::String(s) => Some(s),
            LuaValue::Table(_) => None,
        }
    }

    /// The nested table, if this pair holds one.
    #[must_use]
    pub fn as_table(&self) -> Option<&LuaTable> {
        match &self.value {
            LuaValue::Table(t) => Some(t),
            LuaValue::String(_) => None,
        }
    }
}

/// An ordered sequence of key/value pairs.
///
/// Insertion order is preserved. Keys are not required to be unique; lookups
/// return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LuaTable {
    entries: Vec<LuaTableKeyValue>,
}

impl LuaTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair, keeping any earlier pair with the same key.
    pub fn push(&mut self, kv: LuaTableKeyValue) {
        self.entries.push(kv);
    }

    /// First pair whose key equals `key`.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&LuaTableKeyValue> {
        self.entries.iter().find(|kv| kv.key == key)
    }

    /// String leaf stored under `key`.
    ///
    /// `None` when the key is absent or holds a table.
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.find(key).and_then(LuaTableKeyValue::as_str)
    }

    /// Nested table stored under `key`.
    ///
    /// `None` when the key is absent or holds a string.
    #[must_use]
    pub fn get_table(&self, key: &str) -> Option<&LuaTable> {
        self.find(key).and_then(LuaTableKeyValue::as_table)
    }

    /// Iterates the pairs in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, LuaTableKeyValue> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a LuaTable {
    type Item = &'a LuaTableKeyValue;
    type IntoIter = std::slice::Iter<'a, LuaTableKeyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<LuaTableKeyValue> for LuaTable {
    fn from_iter<I: IntoIterator<Item = LuaTableKeyValue>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
