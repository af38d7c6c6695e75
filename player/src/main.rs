use anyhow::{Context, Result};
use encoder_lib::{
    decode, Cell, Screen, Tile, TILE_HEIGHT, TILE_WIDTH, VIEWPORT_HEIGHT, VIEWPORT_WIDTH,
    VIRTUAL_HEIGHT, VIRTUAL_WIDTH,
};
use image::{GrayImage, Luma};
use indicatif::ProgressIterator;
use std::collections::BTreeMap;
use std::path::Path;
use std::{env, fs};

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let stream = args.next().context("Usage: player <stream> [frames-dir]")?;
    let frames_dir = args.next();

    let bytes = fs::read(&stream).with_context(|| format!("Couldn't read {}", stream))?;
    let screens = decode(&bytes)?;

    eprintln!("({} frames decoded from {} bytes)", screens.len(), bytes.len());

    let Some(frames_dir) = frames_dir else {
        return Ok(());
    };

    fs::create_dir_all(&frames_dir)
        .with_context(|| format!("Couldn't create {}", frames_dir))?;

    for (idx, screen) in screens.iter().enumerate().progress() {
        let path = Path::new(&frames_dir).join(format!("frame-{:05}.png", idx));

        render(screen)
            .save(&path)
            .with_context(|| format!("Couldn't write {}", path.display()))?;
    }

    Ok(())
}

fn render(screen: &Screen) -> GrayImage {
    let mut tiles: BTreeMap<Cell, Tile> = BTreeMap::new();

    for (tile, positions) in screen.tile_positions() {
        for &cell in positions {
            tiles.insert(cell, *tile);
        }
    }

    GrayImage::from_fn(VIEWPORT_WIDTH as u32, VIEWPORT_HEIGHT as u32, |vx, vy| {
        let wx = (screen.x() as u32 + vx) % VIRTUAL_WIDTH as u32;
        let wy = (screen.y() as u32 + vy) % VIRTUAL_HEIGHT as u32;

        let cell = Cell::new(
            (wy / TILE_HEIGHT as u32) as u8,
            (wx / TILE_WIDTH as u32) as u8,
        )
        .expect("virtual coordinates stay inside the tilemap");

        let lit = tiles[&cell].pixel(
            (wx % TILE_WIDTH as u32) as usize,
            (wy % TILE_HEIGHT as u32) as usize,
        );

        Luma([if lit { 0xff } else { 0x00 }])
    })
}
