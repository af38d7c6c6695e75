use anyhow::{ensure, Context, Result};
use encoder_lib::{
    Cell, Encoder, Screen, ScreenRef, Tile, TileMap, TILE_HEIGHT, TILE_WIDTH, VIEWPORT_HEIGHT,
    VIEWPORT_WIDTH,
};
use image::io::Reader as ImageReader;
use image::{Pixel, RgbImage};
use indicatif::ParallelProgressIterator;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, fs};

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let frames_dir = args.next().context("Usage: encoder <frames-dir> <output>")?;
    let output = args.next().context("Usage: encoder <frames-dir> <output>")?;

    let paths = collect_paths(&frames_dir)?;
    ensure!(!paths.is_empty(), "No frames found in {}", frames_dir);

    let len = paths.len();
    let screens = paths
        .into_par_iter()
        .progress_count(len as u64)
        .map(load_screen)
        .collect::<Result<Vec<ScreenRef>>>()?;

    let (stats, bytes) = Encoder::new(&screens)?.encode();

    fs::write(&output, &bytes).with_context(|| format!("Couldn't write {}", output))?;

    eprintln!("{:#?}", stats);
    eprintln!(
        "(encoded {} frames into {} bytes = ~{} bytes per frame)",
        stats.frames,
        stats.bytes,
        stats.bytes / stats.frames,
    );

    Ok(())
}

fn collect_paths(dir: &str) -> Result<Vec<PathBuf>> {
    let pattern = Path::new(dir).join("*.*");
    let paths = glob::glob(&pattern.to_string_lossy()).context("Couldn't find frames")?;

    paths
        .into_iter()
        .map(|path| path.context("Couldn't find frame"))
        .collect()
}

fn load_screen(path: PathBuf) -> Result<ScreenRef> {
    let image = ImageReader::open(&path)
        .with_context(|| format!("Couldn't open frame: {}", path.display()))?
        .decode()
        .with_context(|| format!("Couldn't decode frame: {}", path.display()))?
        .to_rgb8();

    ensure!(
        image.width() == VIEWPORT_WIDTH as u32 && image.height() == VIEWPORT_HEIGHT as u32,
        "Frame {} is {}x{}, expected {}x{}",
        path.display(),
        image.width(),
        image.height(),
        VIEWPORT_WIDTH,
        VIEWPORT_HEIGHT,
    );

    let mut positions: BTreeMap<Tile, BTreeSet<Cell>> = BTreeMap::new();

    for cell in TileMap::viewport(0, 0) {
        positions.entry(cut_tile(&image, cell)).or_default().insert(cell);
    }

    Ok(Arc::new(Screen::new(0, 0, positions)?))
}

fn cut_tile(image: &RgbImage, cell: Cell) -> Tile {
    let mut rows = [0u8; TILE_HEIGHT];

    for y in 0..TILE_HEIGHT {
        for x in 0..TILE_WIDTH {
            let p = {
                let p = image.get_pixel(
                    cell.col() as u32 * TILE_WIDTH as u32 + x as u32,
                    cell.row() as u32 * TILE_HEIGHT as u32 + y as u32,
                );
                let r = p.channels()[0] as f32;
                let g = p.channels()[1] as f32;
                let b = p.channels()[2] as f32;

                (r + g + b) / 3.0 / 255.0
            };

            if p >= 0.5 {
                rows[y] |= 0x80 >> x;
            }
        }
    }

    Tile::from(rows)
}
