use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("a tile pattern holds exactly 12 bytes, got {len}")]
    InvalidTileSize { len: usize },

    #[error("cell ({row}, {col}) is outside the 50x100 tilemap")]
    InvalidCell { row: u8, col: u8 },

    #[error("frame sequence is empty")]
    EmptyInput,

    #[error("frame {frame} uses {count} distinct tiles, the library holds 256")]
    TooManyUniqueTiles { frame: usize, count: usize },

    #[error("corrupt stream at byte {offset}")]
    CorruptStream { offset: usize },

    #[error("zero-length delay at byte {offset}")]
    InvalidDelay { offset: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
