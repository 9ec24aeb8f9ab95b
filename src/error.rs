//! Error types for the PackStream codec and its buffered channel I/O.

use std::string::FromUtf8Error;

use crate::packstream::PackType;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PackStreamError>;

/// Errors that can occur while packing, unpacking or moving bytes.
#[derive(Debug, thiserror::Error)]
pub enum PackStreamError {
    /// The underlying source can never supply the requested bytes.
    #[error("end of stream: expected {expected} bytes but only {available} available")]
    EndOfStream { expected: usize, available: usize },

    /// A length does not fit the representable range.
    #[error("overflow: {0}")]
    Overflow(String),

    /// The marker byte does not match the requested kind of value.
    #[error("wrong type received: expected {expected}, received {found} (0x{marker:02X})")]
    Unexpected {
        expected: PackType,
        found: PackType,
        marker: u8,
    },

    /// A reserved or end-of-stream marker where a whole value should start.
    #[error("unexpected marker 0x{0:02X} where a value was expected")]
    UnexpectedMarker(u8),

    /// A write asked for more bytes than the source range holds.
    #[error("out of bounds: offset {offset} + length {length} exceeds {available} bytes")]
    Bounds {
        offset: usize,
        length: usize,
        available: usize,
    },

    #[error("invalid UTF-8 string: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PackStreamError {
    pub fn overflow(message: impl Into<String>) -> Self {
        Self::Overflow(message.into())
    }

    pub fn end_of_stream(expected: usize, available: usize) -> Self {
        Self::EndOfStream {
            expected,
            available,
        }
    }

    pub(crate) fn unexpected(expected: PackType, marker: u8) -> Self {
        Self::Unexpected {
            expected,
            found: PackType::of(marker),
            marker,
        }
    }

    /// Returns `true` if the error means the input ran dry.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream { .. })
    }
}
