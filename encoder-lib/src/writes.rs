use crate::*;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

/// Borrowed view of the state a write decision is made against. The
/// planner never mutates any of it; the encoder applies the returned
/// plan (or discards it, when probing a hypothetical).
#[derive(Copy, Clone)]
pub struct WriteCtxt<'a> {
    pub library: &'a TileLibrary,
    pub map: &'a TileMap,
    pub screen: &'a Screen,
    pub pool: &'a ReleasePool,
}

/// A proposed set of hardware writes that makes `cells` display `tile`.
/// `released` names the pool tile whose slot the plan overwrites, so the
/// caller can retire it once its last slot is gone.
#[derive(Clone, Debug, Default)]
pub struct WritePlan {
    pub lib_writes: BTreeMap<u8, Tile>,
    pub map_writes: BTreeMap<Cell, u8>,
    pub released: Option<Tile>,
}

impl WritePlan {
    pub fn writes(&self) -> usize {
        self.lib_writes.len() + self.map_writes.len()
    }
}

impl<'a> WriteCtxt<'a> {
    /// Plans the cheapest way to show `tile` at `cells`, trying in
    /// strict order: a slot already holding the tile, a slot whose tile
    /// has been released, consolidating a duplicated tile, and finally
    /// evicting a tile the current screen does not use.
    pub fn plan(&self, tile: Tile, cells: &BTreeSet<Cell>) -> WritePlan {
        debug_assert!(!cells.is_empty());

        self.reuse(tile, cells)
            .or_else(|| self.recycle(tile, cells))
            .or_else(|| self.consolidate(tile, cells))
            .unwrap_or_else(|| self.evict(tile, cells))
    }

    fn reuse(&self, tile: Tile, cells: &BTreeSet<Cell>) -> Option<WritePlan> {
        let slot = self
            .library
            .slots(&tile)
            .iter()
            .copied()
            .min_by_key(|&slot| self.rank(slot))?;

        Some(WritePlan {
            map_writes: self.paint(cells, slot),
            ..Default::default()
        })
    }

    fn recycle(&self, tile: Tile, cells: &BTreeSet<Cell>) -> Option<WritePlan> {
        if self.pool.is_empty() {
            return None;
        }

        // The pool may name tiles that no longer occupy any slot; only a
        // resident one yields a slot to take over.
        let slot =
            (0..=255u8).find(|&slot| self.pool.contains(&self.library.tile(slot)))?;

        Some(WritePlan {
            lib_writes: BTreeMap::from([(slot, tile)]),
            map_writes: self.paint(cells, slot),
            released: Some(self.library.tile(slot)),
        })
    }

    fn consolidate(&self, tile: Tile, cells: &BTreeSet<Cell>) -> Option<WritePlan> {
        if !self.library.has_duplicates() {
            return None;
        }

        let victim = (0..=255u8)
            .filter(|&slot| self.library.slots(&self.library.tile(slot)).len() > 1)
            .min_by_key(|&slot| self.rank(slot))
            .unwrap();
        let displaced = self.library.tile(victim);

        // Cells that keep showing the displaced tile move to the
        // busiest of its surviving slots.
        let merge = self
            .library
            .slots(&displaced)
            .iter()
            .copied()
            .filter(|&slot| slot != victim)
            .min_by_key(|&slot| (Reverse(self.map.positions(slot).len()), slot))
            .unwrap();

        let mut map_writes: BTreeMap<_, _> = self
            .map
            .positions(victim)
            .iter()
            .filter(|cell| {
                self.screen.cells().contains(*cell)
                    && self.screen.positions(&displaced).contains(*cell)
            })
            .map(|&cell| (cell, merge))
            .collect();

        map_writes.extend(self.paint(cells, victim));

        Some(WritePlan {
            lib_writes: BTreeMap::from([(victim, tile)]),
            map_writes,
            released: None,
        })
    }

    fn evict(&self, tile: Tile, cells: &BTreeSet<Cell>) -> WritePlan {
        let slot = (0..=255u8)
            .find(|&slot| self.screen.positions(&self.library.tile(slot)).is_empty())
            .expect("a valid screen holds at most 256 distinct tiles");

        WritePlan {
            lib_writes: BTreeMap::from([(slot, tile)]),
            map_writes: self.paint(cells, slot),
            released: None,
        }
    }

    /// Map writes pointing `cells` at `slot`, minus the ones the map
    /// already satisfies (a no-op map write is illegal in a plan).
    fn paint(&self, cells: &BTreeSet<Cell>, slot: u8) -> BTreeMap<Cell, u8> {
        cells
            .iter()
            .copied()
            .filter(|&cell| self.map.slot(cell) != slot)
            .map(|cell| (cell, slot))
            .collect()
    }

    /// Candidate-slot ordering: fewest on-screen uses, fewest total map
    /// uses, smallest index.
    fn rank(&self, slot: u8) -> (usize, usize, u8) {
        let positions = self.map.positions(slot);
        let on_screen = positions.intersection(self.screen.cells()).count();

        (on_screen, positions.len(), slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn junk(id: u8) -> Tile {
        Tile::from([0xf0, id, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])
    }

    fn screen_of(positions: BTreeMap<Tile, BTreeSet<Cell>>) -> ScreenRef {
        Arc::new(Screen::new(0, 0, positions).unwrap())
    }

    fn uniform_screen(tile: Tile) -> ScreenRef {
        screen_of(BTreeMap::from([(tile, TileMap::viewport(0, 0))]))
    }

    #[test]
    fn reuse_prefers_the_least_used_slot() {
        let mut library = TileLibrary::new();
        let mut map = TileMap::new();
        let screen = uniform_screen(Tile::BLANK);
        let pool = ReleasePool::new();

        library.set(3, Tile::FULL);
        library.set(9, Tile::FULL);
        map.set(Cell::new(0, 0).unwrap(), 9);

        let ctxt = WriteCtxt {
            library: &library,
            map: &map,
            screen: &screen,
            pool: &pool,
        };

        let cells = BTreeSet::from([Cell::new(5, 5).unwrap()]);
        let plan = ctxt.plan(Tile::FULL, &cells);

        assert!(plan.lib_writes.is_empty());
        assert_eq!(
            plan.map_writes,
            BTreeMap::from([(Cell::new(5, 5).unwrap(), 3)])
        );
        assert_eq!(plan.released, None);
    }

    #[test]
    fn recycle_takes_the_lowest_slot_holding_a_released_tile() {
        let mut library = TileLibrary::new();
        let map = TileMap::new();
        let screen = uniform_screen(Tile::BLANK);
        let mut pool = ReleasePool::new();

        let dead = junk(7);
        library.set(5, dead);
        library.set(6, dead);
        pool.insert(dead);

        let ctxt = WriteCtxt {
            library: &library,
            map: &map,
            screen: &screen,
            pool: &pool,
        };

        let target = junk(1);
        let cells = BTreeSet::from([Cell::new(0, 0).unwrap()]);
        let plan = ctxt.plan(target, &cells);

        assert_eq!(plan.lib_writes, BTreeMap::from([(5, target)]));
        assert_eq!(
            plan.map_writes,
            BTreeMap::from([(Cell::new(0, 0).unwrap(), 5)])
        );
        assert_eq!(plan.released, Some(dead));
    }

    #[test]
    fn consolidate_redirects_survivors_and_filters_noop_writes() {
        let mut library = TileLibrary::new();
        let mut map = TileMap::new();
        let pool = ReleasePool::new();

        let a = Tile::from([1; 12]);
        let b = Tile::from([2; 12]);

        // Every slot unique except `a` duplicated in 2 and 3.
        for slot in 0..=255u8 {
            library.set(slot, junk(slot));
        }
        library.set(2, a);
        library.set(3, a);

        let c1 = Cell::new(0, 0).unwrap();
        let c2 = Cell::new(0, 1).unwrap();
        map.set(c1, 2);
        map.set(c2, 2);

        for col in 0..3 {
            map.set(Cell::new(1, col).unwrap(), 3);
        }

        let mut positions: BTreeMap<Tile, BTreeSet<Cell>> = BTreeMap::new();

        for cell in TileMap::viewport(0, 0) {
            let tile = if cell == c2 {
                b
            } else if cell == c1 || (cell.row() == 1 && cell.col() < 3) {
                a
            } else {
                junk(0)
            };

            positions.entry(tile).or_default().insert(cell);
        }

        let screen = screen_of(positions);
        let ctxt = WriteCtxt {
            library: &library,
            map: &map,
            screen: &screen,
            pool: &pool,
        };

        let plan = ctxt.plan(b, &BTreeSet::from([c2]));

        // Victim is slot 2 (fewer uses than 3); c1 keeps showing `a` so
        // it moves to the surviving slot 3; c2 already maps to slot 2,
        // so the library write alone fixes it.
        assert_eq!(plan.lib_writes, BTreeMap::from([(2, b)]));
        assert_eq!(plan.map_writes, BTreeMap::from([(c1, 3)]));
        assert_eq!(plan.released, None);
    }

    #[test]
    fn evict_picks_the_lowest_slot_absent_from_the_screen() {
        let mut library = TileLibrary::new();
        let map = TileMap::new();
        let pool = ReleasePool::new();

        for slot in 0..=255u8 {
            library.set(slot, junk(slot));
        }

        let screen = uniform_screen(junk(5));
        let ctxt = WriteCtxt {
            library: &library,
            map: &map,
            screen: &screen,
            pool: &pool,
        };

        let target = Tile::FULL;
        let cells = BTreeSet::from([Cell::new(0, 0).unwrap()]);
        let plan = ctxt.plan(target, &cells);

        // All cells already map to slot 0, so the library write alone
        // repaints them.
        assert_eq!(plan.lib_writes, BTreeMap::from([(0, target)]));
        assert!(plan.map_writes.is_empty());
    }
}
