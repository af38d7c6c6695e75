mod cell;
mod decoder;
mod error;
mod library;
mod lifetime;
mod params;
mod pool;
mod screen;
mod source;
mod stats;
mod stream;
mod tile;
mod tilemap;
mod update;
mod writes;

use self::{library::*, lifetime::*, pool::*, stream::*, update::*, writes::*};
use std::collections::{BTreeMap, BTreeSet};

pub use self::{
    cell::*, decoder::*, error::*, params::*, screen::*, source::*, stats::*, tile::*,
    tilemap::*,
};

/// One encoding session: walks the target screens in order and turns
/// each into the cheapest set of hardware writes it can find, starting
/// from the blank controller state the decoder starts from too.
///
/// The session is strictly sequential; every decision observes the
/// state left behind by the previous one.
pub struct Encoder {
    frames: Vec<ScreenRef>,
    lifetime: FrameLifetime,
    library: TileLibrary,
    map: TileMap,
    pool: ReleasePool,
    prev_offsets: Option<(u16, u16)>,
    stats: Stats,
}

impl Encoder {
    pub fn new(source: impl FrameSource) -> Result<Self> {
        let frames = source.frames();

        if frames.is_empty() {
            return Err(Error::EmptyInput);
        }

        for (idx, screen) in frames.iter().enumerate() {
            let count = screen.tile_positions().len();

            if count > LIBRARY_SLOTS {
                return Err(Error::TooManyUniqueTiles { frame: idx, count });
            }
        }

        Ok(Self {
            frames: frames.to_vec(),
            lifetime: FrameLifetime::new(TileAppearances::scan(frames)),
            library: TileLibrary::new(),
            map: TileMap::new(),
            pool: ReleasePool::new(),
            prev_offsets: None,
            stats: Stats::default(),
        })
    }

    pub fn encode(mut self) -> (Stats, Vec<u8>) {
        let mut writer = StreamWriter::new();

        for idx in 0..self.frames.len() {
            let update = self.encode_frame(idx);

            match &update {
                Some(update) => {
                    self.stats.updates += 1;
                    self.stats.lib_writes += update.lib_writes.len();
                    self.stats.map_writes += update.map_writes.len();
                }
                None => self.stats.delays += 1,
            }

            writer.push(update.as_ref());
            self.stats.frames += 1;
        }

        let bytes = writer.finish();
        self.stats.bytes = bytes.len();

        (self.stats, bytes)
    }

    fn encode_frame(&mut self, idx: usize) -> Option<ScreenUpdate> {
        let screen = self.frames[idx].clone();
        let mut lib_writes = BTreeMap::new();
        let mut map_writes = BTreeMap::new();
        let mut releases = Vec::new();

        for (&tile, target) in screen.tile_positions() {
            let mut by_slot: BTreeMap<u8, BTreeSet<Cell>> = BTreeMap::new();

            for &cell in target {
                by_slot.entry(self.map.slot(cell)).or_default().insert(cell);
            }

            for (slot, inside) in by_slot {
                if self.library.tile(slot) == tile {
                    continue;
                }

                self.encode_bucket(
                    &screen,
                    tile,
                    target,
                    slot,
                    &inside,
                    &mut lib_writes,
                    &mut map_writes,
                );
            }

            // A tile seen for the last time becomes reusable, but only
            // once the whole frame has committed.
            if self.lifetime.expire(&tile, idx) {
                releases.push(tile);
            }
        }

        for tile in releases {
            self.pool.insert(tile);
        }

        let offsets = (screen.x(), screen.y());
        let idle = self.prev_offsets == Some(offsets)
            && lib_writes.is_empty()
            && map_writes.is_empty();
        self.prev_offsets = Some(offsets);

        (!idle).then(|| ScreenUpdate {
            x: offsets.0,
            y: offsets.1,
            lib_writes,
            map_writes,
        })
    }

    /// Settles one (target tile, old slot) bucket: either repaint the
    /// bucket's cells onto some slot (standard), or write the tile over
    /// the slot they already occupy and re-home whatever visible cells
    /// still need the displaced tile (swap). Swap costs its one library
    /// write extra; ties go to standard.
    #[allow(clippy::too_many_arguments)]
    fn encode_bucket(
        &mut self,
        screen: &Screen,
        tile: Tile,
        target: &BTreeSet<Cell>,
        slot: u8,
        inside: &BTreeSet<Cell>,
        lib_writes: &mut BTreeMap<u8, Tile>,
        map_writes: &mut BTreeMap<Cell, u8>,
    ) {
        let displaced = self.library.tile(slot);

        let outside: BTreeSet<Cell> = self
            .map
            .positions(slot)
            .iter()
            .filter(|cell| {
                !target.contains(*cell)
                    && screen.cells().contains(*cell)
                    && screen.positions(&displaced).contains(*cell)
            })
            .copied()
            .collect();

        let standard = WriteCtxt {
            library: &self.library,
            map: &self.map,
            screen,
            pool: &self.pool,
        }
        .plan(tile, inside);

        // The swap repair is planned against a hypothetical library,
        // never against mutated state.
        let swap = if outside.is_empty() {
            WritePlan::default()
        } else {
            let mut library = self.library.clone();
            library.set(slot, tile);

            let mut pool = self.pool.clone();

            if library.slots(&displaced).is_empty() {
                pool.remove(&displaced);
            }

            WriteCtxt {
                library: &library,
                map: &self.map,
                screen,
                pool: &pool,
            }
            .plan(displaced, &outside)
        };

        if swap.writes() + 1 < standard.writes() {
            self.write_library(slot, tile, lib_writes);

            if self.library.slots(&displaced).is_empty() {
                self.pool.remove(&displaced);
            }

            self.apply(&swap, lib_writes, map_writes);
        } else {
            self.apply(&standard, lib_writes, map_writes);
        }
    }

    fn apply(
        &mut self,
        plan: &WritePlan,
        lib_writes: &mut BTreeMap<u8, Tile>,
        map_writes: &mut BTreeMap<Cell, u8>,
    ) {
        for (&slot, &tile) in &plan.lib_writes {
            self.write_library(slot, tile, lib_writes);
        }

        for (&cell, &slot) in &plan.map_writes {
            self.map.set(cell, slot);
            map_writes.insert(cell, slot);
        }

        // A recycled slot's old tile leaves the pool with its last
        // slot.
        if let Some(released) = &plan.released {
            if self.library.slots(released).is_empty() {
                self.pool.remove(released);
            }
        }
    }

    fn write_library(&mut self, slot: u8, tile: Tile, lib_writes: &mut BTreeMap<u8, Tile>) {
        self.library.set(slot, tile);
        lib_writes.insert(slot, tile);
    }
}
