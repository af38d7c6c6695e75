use crate::*;
use std::collections::{BTreeMap, BTreeSet};

static NO_SLOTS: BTreeSet<u8> = BTreeSet::new();

/// Mirror of the controller's pattern memory: 256 tile slots plus the
/// reverse index `tile -> set of slots`. The swap evaluation clones it
/// to probe a hypothetical future, hence `Clone`.
#[derive(Clone)]
pub struct TileLibrary {
    slots: [Tile; LIBRARY_SLOTS],
    reverse: BTreeMap<Tile, BTreeSet<u8>>,
}

impl TileLibrary {
    pub fn new() -> Self {
        let mut reverse = BTreeMap::new();

        reverse.insert(Tile::BLANK, (0..=255).collect());

        Self {
            slots: [Tile::BLANK; LIBRARY_SLOTS],
            reverse,
        }
    }

    pub fn tile(&self, slot: u8) -> Tile {
        self.slots[slot as usize]
    }

    pub fn set(&mut self, slot: u8, tile: Tile) {
        let old = self.slots[slot as usize];

        if old == tile {
            return;
        }

        let stale = {
            let slots = self.reverse.get_mut(&old).unwrap();
            slots.remove(&slot);
            slots.is_empty()
        };

        if stale {
            self.reverse.remove(&old);
        }

        self.reverse.entry(tile).or_default().insert(slot);
        self.slots[slot as usize] = tile;
    }

    pub fn slots(&self, tile: &Tile) -> &BTreeSet<u8> {
        self.reverse.get(tile).unwrap_or(&NO_SLOTS)
    }

    pub fn has_duplicates(&self) -> bool {
        self.reverse.values().any(|slots| slots.len() > 1)
    }
}

impl Default for TileLibrary {
    fn default() -> Self {
        Self::new()
    }
}
