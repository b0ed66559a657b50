//! Error types for ICO encoding

use thiserror::Error;

/// Errors raised while building an ICO container
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IcoError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
}

/// Reasons an image set cannot be encoded
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("no images to encode")]
    EmptyImageSet,

    #[error("edge length {0} is outside 1..=256")]
    EdgeLengthOutOfRange(u32),

    #[error("image of edge length {0} has no encoded bytes")]
    EmptyImageData(u32),

    #[error("edge length {0} appears more than once")]
    DuplicateEdgeLength(u32),

    #[error("total size of {0} bytes does not fit a 32-bit offset")]
    TooLarge(usize),
}
