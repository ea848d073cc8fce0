//! Error type for buffer encoding and decoding.

use thiserror::Error;

/// Errors produced by the buffer codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// An attribute's item size is zero.
    #[error("item size must be at least 1")]
    ZeroItemSize,
    /// Buffer length is not a multiple of the item size.
    #[error("buffer length {len} is not a multiple of item size {item_size}")]
    StrideMismatch { len: usize, item_size: usize },
    /// A descriptor points past the end of the out-of-band buffer list.
    #[error("descriptor references out-of-band buffer {id}, but only {available} were provided")]
    MissingTransfer { id: usize, available: usize },
    /// A descriptor's byte offset is not a multiple of the element width.
    #[error("byte offset {offset} is not aligned to the {width}-byte elements of {ctor}")]
    Misaligned {
        offset: usize,
        width: usize,
        ctor: &'static str,
    },
    /// A descriptor's byte range exceeds the referenced raw buffer.
    #[error("descriptor range {offset}..{end} exceeds raw buffer of {byte_len} bytes")]
    OutOfBounds {
        offset: usize,
        end: usize,
        byte_len: usize,
    },
    /// Raw bytes do not hold a whole number of elements.
    #[error("raw buffer of {byte_len} bytes is not a whole number of {width}-byte elements")]
    PartialElement { byte_len: usize, width: usize },
}
