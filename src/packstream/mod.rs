//! PackStream binary encoding format.
//!
//! PackStream is a binary presentation format for the exchange of richly-typed
//! data. It uses big-endian byte ordering exclusively. The [`Packer`] writes
//! values to any [`PackOutput`](crate::io::PackOutput) and the [`Unpacker`]
//! reads them back from any [`PackInput`](crate::io::PackInput).

use std::fmt;

pub mod marker;
pub mod packer;
pub mod unpacker;

pub use packer::Packer;
pub use unpacker::Unpacker;

/// Raw size reported for a streamed container (`-1` widened to unsigned).
pub const UNKNOWN_SIZE: u64 = u64::MAX;

/// The kind of value announced by a marker byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackType {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Bytes,
    List,
    Map,
    Struct,
    /// The terminator of a streamed list or map.
    EndOfStream,
    /// A marker byte with no assigned meaning.
    Reserved,
}

impl PackType {
    /// Classifies a marker byte.
    pub fn of(m: u8) -> Self {
        match m {
            0x00..=0x7F | 0xF0..=0xFF => Self::Integer,
            0x80..=0x8F => Self::String,
            0x90..=0x9F => Self::List,
            0xA0..=0xAF => Self::Map,
            0xB0..=0xBF => Self::Struct,
            marker::NULL => Self::Null,
            marker::FLOAT_64 => Self::Float,
            marker::FALSE | marker::TRUE => Self::Boolean,
            marker::INT_8..=marker::INT_64 => Self::Integer,
            marker::BYTES_8 | marker::BYTES_16 | marker::BYTES_32 => Self::Bytes,
            marker::STRING_8 | marker::STRING_16 | marker::STRING_32 => Self::String,
            marker::LIST_8..=marker::LIST_STREAM => Self::List,
            marker::MAP_8..=marker::MAP_STREAM => Self::Map,
            marker::STRUCT_8 | marker::STRUCT_16 => Self::Struct,
            marker::END_OF_STREAM => Self::EndOfStream,
            _ => Self::Reserved,
        }
    }
}

impl fmt::Display for PackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "NULL",
            Self::Boolean => "BOOLEAN",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::String => "STRING",
            Self::Bytes => "BYTES",
            Self::List => "LIST",
            Self::Map => "MAP",
            Self::Struct => "STRUCT",
            Self::EndOfStream => "END_OF_STREAM",
            Self::Reserved => "RESERVED",
        };
        f.write_str(name)
    }
}

/// Size announced by a list or map header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    /// Exactly this many elements follow.
    Known(usize),
    /// Elements follow until an end-of-stream marker.
    Streamed,
}

impl Length {
    pub fn known(self) -> Option<usize> {
        match self {
            Self::Known(n) => Some(n),
            Self::Streamed => None,
        }
    }

    pub fn is_streamed(self) -> bool {
        matches!(self, Self::Streamed)
    }

    /// The size as a raw count, with [`UNKNOWN_SIZE`] for streamed headers.
    pub fn as_raw(self) -> u64 {
        match self {
            Self::Known(n) => n as u64,
            Self::Streamed => UNKNOWN_SIZE,
        }
    }
}
