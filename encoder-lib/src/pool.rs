use crate::*;
use std::collections::BTreeSet;

/// Tiles whose final scripted appearance has passed. A library slot
/// holding one of these may be overwritten freely; the tile leaves the
/// pool when its last slot goes.
#[derive(Clone, Debug, Default)]
pub struct ReleasePool {
    tiles: BTreeSet<Tile>,
}

impl ReleasePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tile: Tile) {
        self.tiles.insert(tile);
    }

    pub fn remove(&mut self, tile: &Tile) {
        self.tiles.remove(tile);
    }

    pub fn contains(&self, tile: &Tile) -> bool {
        self.tiles.contains(tile)
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
