pub const TILE_WIDTH: usize = 8;
pub const TILE_HEIGHT: usize = 12;
pub const TILE_BYTES: usize = 12;

pub const MAP_ROWS: usize = 50;
pub const MAP_COLS: usize = 100;
pub const MAP_CELLS: usize = MAP_ROWS * MAP_COLS;

pub const LIBRARY_SLOTS: usize = 256;

pub const VIRTUAL_WIDTH: u16 = 800;
pub const VIRTUAL_HEIGHT: u16 = 600;

pub const VIEWPORT_WIDTH: u16 = 400;
pub const VIEWPORT_HEIGHT: u16 = 300;
