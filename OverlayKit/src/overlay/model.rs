//! Overlay document structures

use serde::Serialize;

/// Reserved tile name meaning "no tile".
pub const NO_TILE: &str = "none";

/// Default `chance` weight of a tile overlay entry.
pub const DEFAULT_CHANCE: i32 = 1;

/// Minimum number of tile slots a container overlay entry carries.
pub const CONTAINER_MIN_TILES: usize = 2;

/// Behaviour shared by both kinds of overlay entry.
pub trait OverlayEntry {
    /// Room or category this entry applies to.
    fn room_name(&self) -> &str;

    fn set_room_name(&mut self, name: String);

    /// Candidate tile names, in slot order.
    fn tiles(&self) -> &[String];

    fn tiles_mut(&mut self) -> &mut Vec<String>;

    /// Free-text note about where the entry is used.
    fn usage(&self) -> &str;

    fn set_usage(&mut self, usage: String);
}

/// An overlay: substitution rules for one base tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overlay<E> {
    /// Base tile the overlay is keyed by.
    pub tile_name: String,
    entries: Vec<E>,
}

impl<E: OverlayEntry> Overlay<E> {
    /// Creates an overlay with no entries.
    #[must_use]
    pub fn new(tile_name: impl Into<String>) -> Self {
        Self {
            tile_name: tile_name.into(),
            entries: Vec::new(),
        }
    }

    /// Creates an overlay from existing entries.
    #[must_use]
    pub fn with_entries(tile_name: impl Into<String>, entries: Vec<E>) -> Self {
        Self {
            tile_name: tile_name.into(),
            entries,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [E] {
        &mut self.entries
    }

    /// Appends an entry.
    pub fn push_entry(&mut self, entry: E) {
        self.entries.push(entry);
    }

    /// Inserts an entry at `index`; an index past the end appends.
    pub fn insert_entry(&mut self, index: usize, entry: E) {
        let index = index.min(self.entries.len());
        self.entries.insert(index, entry);
    }

    /// Removes and returns the entry at `index`, or `None` if out of range.
    pub fn remove_entry(&mut self, index: usize) -> Option<E> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Entry for `room_name`, if any.
    #[must_use]
    pub fn entry(&self, room_name: &str) -> Option<&E> {
        self.entries.iter().find(|e| e.room_name() == room_name)
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

/// Container overlay entry: alternative tiles for one room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerOverlayEntry {
    pub room_name: String,
    pub tiles: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
}

impl ContainerOverlayEntry {
    #[must_use]
    pub fn new(room_name: impl Into<String>, tiles: Vec<String>) -> Self {
        Self {
            room_name: room_name.into(),
            tiles,
            usage: String::new(),
        }
    }

    /// Pads the tile list with [`NO_TILE`] up to [`CONTAINER_MIN_TILES`] slots.
    pub fn pad_tiles(&mut self) {
        while self.tiles.len() < CONTAINER_MIN_TILES {
            self.tiles.push(NO_TILE.to_string());
        }
    }
}

impl OverlayEntry for ContainerOverlayEntry {
    fn room_name(&self) -> &str {
        &self.room_name
    }

    fn set_room_name(&mut self, name: String) {
        self.room_name = name;
    }

    fn tiles(&self) -> &[String] {
        &self.tiles
    }

    fn tiles_mut(&mut self) -> &mut Vec<String> {
        &mut self.tiles
    }

    fn usage(&self) -> &str {
        &self.usage
    }

    fn set_usage(&mut self, usage: String) {
        self.usage = usage;
    }
}

/// Tile overlay entry: weighted alternative tiles for one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileOverlayEntry {
    pub room_name: String,
    pub tiles: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
    /// Relative weight when several entries match.
    pub chance: i32,
}

impl Default for TileOverlayEntry {
    fn default() -> Self {
        Self {
            room_name: String::new(),
            tiles: Vec::new(),
            usage: String::new(),
            chance: DEFAULT_CHANCE,
        }
    }
}

impl TileOverlayEntry {
    #[must_use]
    pub fn new(room_name: impl Into<String>, tiles: Vec<String>) -> Self {
        Self {
            room_name: room_name.into(),
            tiles,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_chance(mut self, chance: i32) -> Self {
        self.chance = chance;
        self
    }
}

impl OverlayEntry for TileOverlayEntry {
    fn room_name(&self) -> &str {
        &self.room_name
    }

    fn set_room_name(&mut self, name: String) {
        self.room_name = name;
    }

    fn tiles(&self) -> &[String] {
        &self.tiles
    }

    fn tiles_mut(&mut self) -> &mut Vec<String> {
        &mut self.tiles
    }

    fn usage(&self) -> &str {
        &self.usage
    }

    fn set_usage(&mut self, usage: String) {
        self.usage = usage;
    }
}

/// Overlay whose entries are [`ContainerOverlayEntry`].
pub type ContainerOverlay = Overlay<ContainerOverlayEntry>;

/// Overlay whose entries are [`TileOverlayEntry`].
pub type TileOverlay = Overlay<TileOverlayEntry>;

#[cfg(test)]
mod tests {
    use super::*;

    fn tiles(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_insert_and_remove_entries() {
        let mut overlay = ContainerOverlay::new("door_1");
        overlay.push_entry(ContainerOverlayEntry::new("shop", tiles(&["a_1"])));
        overlay.insert_entry(0, ContainerOverlayEntry::new("bar", tiles(&["b_1"])));
        overlay.insert_entry(99, ContainerOverlayEntry::new("zoo", tiles(&["c_1"])));

        let rooms: Vec<_> = overlay.entries().iter().map(|e| e.room_name()).collect();
        assert_eq!(rooms, ["bar", "shop", "zoo"]);

        let removed = overlay.remove_entry(1).unwrap();
        assert_eq!(removed.room_name, "shop");
        assert!(overlay.remove_entry(5).is_none());
        assert_eq!(overlay.len(), 2);
        assert!(overlay.entry("zoo").is_some());
        assert!(overlay.entry("shop").is_none());
    }

    #[test]
    fn test_container_padding() {
        let mut entry = ContainerOverlayEntry::new("shop", tiles(&["a_1"]));
        entry.pad_tiles();
        assert_eq!(entry.tiles, tiles(&["a_1", NO_TILE]));

        let mut full = ContainerOverlayEntry::new("shop", tiles(&["a_1", "a_2", "a_3"]));
        full.pad_tiles();
        assert_eq!(full.tiles.len(), 3);
    }

    #[test]
    fn test_tile_entry_default_chance() {
        let entry = TileOverlayEntry::new("shop", tiles(&["a_1"]));
        assert_eq!(entry.chance, DEFAULT_CHANCE);
        assert_eq!(entry.with_chance(5).chance, 5);
    }
}
