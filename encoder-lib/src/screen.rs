use crate::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub type ScreenRef = Arc<Screen>;

/// An immutable target frame: viewport offsets plus `tile -> cells` for
/// exactly the cells visible at those offsets.
///
/// Screens are built once by the frame source (or the decoder) and then
/// shared; the appearance index, the frame list and the reconstructed
/// output all hold the same `Arc`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Screen {
    x: u16,
    y: u16,
    tile_positions: BTreeMap<Tile, BTreeSet<Cell>>,
    cells: BTreeSet<Cell>,
}

impl Screen {
    /// Offsets are normalized modulo the 800x600 virtual space. The
    /// positions must partition the viewport cell set: a cell claimed
    /// twice, a cell outside the viewport or an uncovered viewport cell
    /// is rejected.
    pub fn new(
        x: u16,
        y: u16,
        mut tile_positions: BTreeMap<Tile, BTreeSet<Cell>>,
    ) -> Result<Self> {
        // The key set is exactly the set of visible tiles.
        tile_positions.retain(|_, positions| !positions.is_empty());

        let x = x % VIRTUAL_WIDTH;
        let y = y % VIRTUAL_HEIGHT;
        let cells = TileMap::viewport(x, y);

        let mut seen = BTreeSet::new();

        for positions in tile_positions.values() {
            for &cell in positions {
                // Outside the viewport, or claimed by two tiles.
                if !cells.contains(&cell) || !seen.insert(cell) {
                    return Err(Error::InvalidCell {
                        row: cell.row(),
                        col: cell.col(),
                    });
                }
            }
        }

        if seen.len() != cells.len() {
            let missing = cells.iter().find(|cell| !seen.contains(*cell)).unwrap();

            return Err(Error::InvalidCell {
                row: missing.row(),
                col: missing.col(),
            });
        }

        Ok(Self {
            x,
            y,
            tile_positions,
            cells,
        })
    }

    pub fn x(&self) -> u16 {
        self.x
    }

    pub fn y(&self) -> u16 {
        self.y
    }

    pub fn tile_positions(&self) -> &BTreeMap<Tile, BTreeSet<Cell>> {
        &self.tile_positions
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tile_positions.keys()
    }

    /// Cells that should display `tile` in this frame; empty when the
    /// tile is not on screen.
    pub fn positions(&self, tile: &Tile) -> &BTreeSet<Cell> {
        self.tile_positions
            .get(tile)
            .unwrap_or_else(|| TileMap::no_cells())
    }

    /// The visible cell set at this screen's offsets.
    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }
}
