//! Score loaders for playtune.
//!
//! Reads Playtune bytestreams (with or without their file header) and the C
//! byte-array sources scores are usually shipped as, and checks the result
//! against the interpreter's command set.

mod c_array;
mod playtune_format;

pub use c_array::parse_c_array;
pub use playtune_format::{load_c_source, load_score, LoadedScore, PlaytuneHeader};

/// Error type for score loading.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("invalid Playtune header: {0}")]
    InvalidHeader(String),
    #[error("unexpected end of file")]
    UnexpectedEof,
    #[error("unsupported score feature: {0}")]
    Unsupported(&'static str),
    #[error("no byte array found in source")]
    NoArray,
    #[error("invalid byte value `{0}`")]
    InvalidByte(String),
    #[error(transparent)]
    Score(#[from] pt_score::ScoreError),
}
