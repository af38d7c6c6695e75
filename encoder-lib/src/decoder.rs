use crate::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Reconstructs the screen sequence a compressed stream encodes.
///
/// Anything after the end marker is ignored; a malformed word reports
/// [`Error::CorruptStream`] (or [`Error::InvalidDelay`]) at the byte
/// offset of the offending datum.
pub fn decode(bytes: &[u8]) -> Result<Vec<ScreenRef>> {
    StreamReader::new(bytes).run()
}

/// The encoder's inverse: drives the same mirrored hardware state
/// (library, tilemap, offsets) from the byte stream and materializes a
/// screen from it after every update.
pub struct StreamReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    library: TileLibrary,
    map: TileMap,
    x: u16,
    y: u16,
}

impl<'a> StreamReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            library: TileLibrary::new(),
            map: TileMap::new(),
            x: 0,
            y: 0,
        }
    }

    pub fn run(mut self) -> Result<Vec<ScreenRef>> {
        let mut screens = Vec::new();

        loop {
            let at = self.pos;

            match self.word()? {
                word if word == RESET as u16 => {
                    return if self.word()? == (RESET >> 16) as u16 {
                        Ok(screens)
                    } else {
                        Err(Error::CorruptStream { offset: at })
                    };
                }

                DELAY => {
                    let at = self.pos;
                    let count = self.word()?;

                    if count == 0 {
                        return Err(Error::InvalidDelay { offset: at });
                    }

                    let screen = self.screen()?;
                    screens.extend((0..count).map(|_| screen.clone()));
                }

                x => {
                    if x >= VIRTUAL_WIDTH {
                        return Err(Error::CorruptStream { offset: at });
                    }

                    screens.push(self.update(x)?);
                }
            }
        }
    }

    fn update(&mut self, x: u16) -> Result<ScreenRef> {
        let at = self.pos;
        let y = self.word()?;

        if y >= VIRTUAL_HEIGHT {
            return Err(Error::CorruptStream { offset: at });
        }

        let at = self.pos;
        let lib_writes = self.word()?;

        if lib_writes as usize > LIBRARY_SLOTS {
            return Err(Error::CorruptStream { offset: at });
        }

        let at = self.pos;
        let map_writes = self.word()?;

        if map_writes as usize > MAP_CELLS {
            return Err(Error::CorruptStream { offset: at });
        }

        self.x = x;
        self.y = y;

        for _ in 0..lib_writes {
            let at = self.pos;
            let head = self.take(4)?;

            // The slot index is a 32-bit word; only the low byte may be
            // set.
            if head[1..] != [0, 0, 0] {
                return Err(Error::CorruptStream { offset: at });
            }

            let slot = head[0];
            let tile = Tile::new(self.take(12)?)?;

            self.library.set(slot, tile);
        }

        for _ in 0..map_writes {
            let at = self.pos;
            let record = self.take(4)?;

            if record[3] != 0 {
                return Err(Error::CorruptStream { offset: at });
            }

            let cell = Cell::new(record[0], record[1])
                .map_err(|_| Error::CorruptStream { offset: at })?;

            self.map.set(cell, record[2]);
        }

        self.screen()
    }

    fn screen(&self) -> Result<ScreenRef> {
        let mut positions: BTreeMap<Tile, BTreeSet<Cell>> = BTreeMap::new();

        for cell in TileMap::viewport(self.x, self.y) {
            positions
                .entry(self.library.tile(self.map.slot(cell)))
                .or_default()
                .insert(cell);
        }

        Ok(Arc::new(Screen::new(self.x, self.y, positions)?))
    }

    fn word(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;

        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let bytes = self
            .bytes
            .get(self.pos..self.pos + len)
            .ok_or(Error::CorruptStream { offset: self.pos })?;

        self.pos += len;

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_stream_yields_one_blank_screen() {
        let bytes = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // update, no writes
            0xef, 0xbe, 0xfe, 0xca,
        ];

        let screens = decode(&bytes).unwrap();

        assert_eq!(screens.len(), 1);
        assert_eq!(screens[0].x(), 0);
        assert_eq!(
            screens[0].positions(&Tile::BLANK).len(),
            screens[0].cells().len()
        );
    }

    #[test]
    fn truncated_stream_is_corrupt_at_its_end() {
        assert_eq!(
            decode(&[0xef, 0xbe]),
            Err(Error::CorruptStream { offset: 2 })
        );
        assert_eq!(decode(&[]), Err(Error::CorruptStream { offset: 0 }));
    }

    #[test]
    fn end_marker_needs_both_words() {
        assert_eq!(
            decode(&[0xef, 0xbe, 0x00, 0x00]),
            Err(Error::CorruptStream { offset: 0 })
        );
    }

    #[test]
    fn out_of_range_offsets_are_corrupt() {
        // x = 801
        assert_eq!(
            decode(&[0x21, 0x03]),
            Err(Error::CorruptStream { offset: 0 })
        );

        // y = 600
        assert_eq!(
            decode(&[0x00, 0x00, 0x58, 0x02]),
            Err(Error::CorruptStream { offset: 2 })
        );
    }

    #[test]
    fn zero_delay_is_rejected() {
        assert_eq!(
            decode(&[0xbe, 0xba, 0x00, 0x00]),
            Err(Error::InvalidDelay { offset: 2 })
        );
    }

    #[test]
    fn nonzero_padding_is_corrupt() {
        // One library write with a dirty slot word.
        let mut bytes = vec![0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(&[3, 1, 0, 0]);
        bytes.extend_from_slice(&[0; 12]);

        assert_eq!(decode(&bytes), Err(Error::CorruptStream { offset: 8 }));
    }

    #[test]
    fn out_of_range_map_cell_is_corrupt() {
        // One map write at row 50.
        let bytes = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, // update, M = 1
            50, 0, 1, 0,
        ];

        assert_eq!(decode(&bytes), Err(Error::CorruptStream { offset: 8 }));
    }

    #[test]
    fn bytes_after_the_end_marker_are_ignored() {
        let bytes = [0xef, 0xbe, 0xfe, 0xca, 0xde, 0xad];

        assert_eq!(decode(&bytes).unwrap().len(), 0);
    }

    #[test]
    fn leading_delay_replays_the_blank_initial_state() {
        let bytes = [0xbe, 0xba, 0x02, 0x00, 0xef, 0xbe, 0xfe, 0xca];

        let screens = decode(&bytes).unwrap();

        assert_eq!(screens.len(), 2);
        assert_eq!(screens[0], screens[1]);
        assert_eq!(
            screens[0].positions(&Tile::BLANK).len(),
            screens[0].cells().len()
        );
    }
}
