use crate::*;
use std::collections::{BTreeMap, VecDeque};

/// For each distinct tile, the ascending frame indices where it appears.
/// Built by one scan over the whole sequence before encoding starts.
#[derive(Debug)]
pub struct TileAppearances {
    by_tile: BTreeMap<Tile, VecDeque<usize>>,
}

impl TileAppearances {
    pub fn scan(frames: &[ScreenRef]) -> Self {
        let mut by_tile: BTreeMap<Tile, VecDeque<usize>> = BTreeMap::new();

        for (idx, screen) in frames.iter().enumerate() {
            for tile in screen.tiles() {
                by_tile.entry(*tile).or_default().push_back(idx);
            }
        }

        Self { by_tile }
    }
}

/// Walks the appearance index alongside the encoder. After a tile's
/// buckets commit in frame `idx`, [`FrameLifetime::expire`] consumes the
/// leading appearance and reports whether it was the tile's last, in
/// which case the encoder schedules the tile for release once the whole
/// frame has committed.
#[derive(Debug)]
pub struct FrameLifetime {
    appearances: TileAppearances,
}

impl FrameLifetime {
    pub fn new(appearances: TileAppearances) -> Self {
        Self { appearances }
    }

    pub fn expire(&mut self, tile: &Tile, frame: usize) -> bool {
        let frames = self
            .appearances
            .by_tile
            .get_mut(tile)
            .unwrap_or_else(|| unreachable!("tile was scanned before encoding"));

        debug_assert_eq!(frames.front(), Some(&frame));

        frames.pop_front();
        frames.is_empty()
    }
}
