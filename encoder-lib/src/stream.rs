use crate::*;

/// End-of-stream marker, serialized little-endian as the two words
/// `0xBEEF, 0xCAFE`. Neither it nor [`DELAY`] can collide with an
/// update, whose first word is an x-offset below 800.
pub(crate) const RESET: u32 = 0xcafe_beef;
pub(crate) const DELAY: u16 = 0xbabe;

/// Serializes per-frame diffs, coalescing runs of idle frames into
/// delay commands.
pub struct StreamWriter {
    buffer: Vec<u8>,
    delay: u16,
}

impl StreamWriter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            delay: 0,
        }
    }

    pub fn push(&mut self, update: Option<&ScreenUpdate>) {
        let Some(update) = update else {
            if self.delay == u16::MAX {
                self.flush_delay();
            }

            self.delay += 1;
            return;
        };

        self.flush_delay();

        self.word(update.x);
        self.word(update.y);
        self.word(update.lib_writes.len() as u16);
        self.word(update.map_writes.len() as u16);

        // Library records are 16 bytes (slot index padded to a word,
        // then the pattern), map records 4; both stay naturally aligned.
        for (&slot, tile) in &update.lib_writes {
            self.buffer.extend_from_slice(&[slot, 0, 0, 0]);
            self.buffer.extend_from_slice(tile.rows());
        }

        for (&cell, &slot) in &update.map_writes {
            self.buffer
                .extend_from_slice(&[cell.row(), cell.col(), slot, 0]);
        }
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.flush_delay();
        self.buffer.extend_from_slice(&RESET.to_le_bytes());
        self.buffer
    }

    fn flush_delay(&mut self) {
        if self.delay > 0 {
            self.word(DELAY);
            self.word(self.delay);
            self.delay = 0;
        }
    }

    fn word(&mut self, word: u16) {
        self.buffer.extend_from_slice(&word.to_le_bytes());
    }
}

impl Default for StreamWriter {
    fn default() -> Self {
        Self::new()
    }
}
