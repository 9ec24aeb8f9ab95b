//! Byte-level input and output for the PackStream codec.
//!
//! The codec only sees the [`PackInput`] and [`PackOutput`] traits. The
//! buffered channel types implement them over any blocking
//! [`std::io::Read`] source or [`std::io::Write`] sink.

use bytes::Buf;

use crate::error::Result;

mod input;
mod output;

pub use input::{BufferedChannelInput, MAX_STALLED_READS};
pub use output::BufferedChannelOutput;

/// Smallest buffer capacity accepted; fits the widest fixed-width value.
pub const MIN_BUFFER_CAPACITY: usize = 8;

/// Exact-size, big-endian reads.
///
/// Every read either returns the full value or fails; a short read is
/// reported as [`PackStreamError::EndOfStream`](crate::PackStreamError::EndOfStream).
pub trait PackInput {
    /// Returns `true` if at least one more byte can be read.
    fn has_more_data(&mut self) -> Result<bool>;

    fn read_u8(&mut self) -> Result<u8>;

    fn read_i16(&mut self) -> Result<i16>;

    fn read_i32(&mut self) -> Result<i32>;

    fn read_i64(&mut self) -> Result<i64>;

    fn read_f64(&mut self) -> Result<f64>;

    /// Fills `into` completely.
    fn read_bytes(&mut self, into: &mut [u8]) -> Result<()>;

    /// Returns the next byte without consuming it.
    fn peek_u8(&mut self) -> Result<u8>;
}

/// Big-endian writes. Write methods return `&mut Self` so calls chain.
pub trait PackOutput {
    fn write_u8(&mut self, value: u8) -> Result<&mut Self>;

    fn write_i16(&mut self, value: i16) -> Result<&mut Self>;

    fn write_i32(&mut self, value: i32) -> Result<&mut Self>;

    fn write_i64(&mut self, value: i64) -> Result<&mut Self>;

    fn write_f64(&mut self, value: f64) -> Result<&mut Self>;

    /// Writes `data[offset..offset + length]`.
    ///
    /// Fails with [`PackStreamError::Bounds`](crate::PackStreamError::Bounds)
    /// before writing anything if the range falls outside `data`.
    fn write_bytes(&mut self, data: &[u8], offset: usize, length: usize) -> Result<&mut Self>;

    /// Writes every remaining byte of `src`.
    fn write_buf(&mut self, mut src: impl Buf) -> Result<&mut Self>
    where
        Self: Sized,
    {
        while src.has_remaining() {
            let chunk = src.chunk();
            let n = chunk.len();
            self.write_bytes(chunk, 0, n)?;
            src.advance(n);
        }
        Ok(self)
    }

    /// Pushes all buffered bytes to the underlying sink.
    fn flush(&mut self) -> Result<&mut Self>;

    fn begin_message(&mut self) -> Result<()> {
        Ok(())
    }

    fn message_succeeded(&mut self) -> Result<()> {
        Ok(())
    }

    fn message_failed(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: PackInput + ?Sized> PackInput for &mut T {
    fn has_more_data(&mut self) -> Result<bool> {
        (**self).has_more_data()
    }

    fn read_u8(&mut self) -> Result<u8> {
        (**self).read_u8()
    }

    fn read_i16(&mut self) -> Result<i16> {
        (**self).read_i16()
    }

    fn read_i32(&mut self) -> Result<i32> {
        (**self).read_i32()
    }

    fn read_i64(&mut self) -> Result<i64> {
        (**self).read_i64()
    }

    fn read_f64(&mut self) -> Result<f64> {
        (**self).read_f64()
    }

    fn read_bytes(&mut self, into: &mut [u8]) -> Result<()> {
        (**self).read_bytes(into)
    }

    fn peek_u8(&mut self) -> Result<u8> {
        (**self).peek_u8()
    }
}

impl<T: PackOutput> PackOutput for &mut T {
    fn write_u8(&mut self, value: u8) -> Result<&mut Self> {
        (**self).write_u8(value)?;
        Ok(self)
    }

    fn write_i16(&mut self, value: i16) -> Result<&mut Self> {
        (**self).write_i16(value)?;
        Ok(self)
    }

    fn write_i32(&mut self, value: i32) -> Result<&mut Self> {
        (**self).write_i32(value)?;
        Ok(self)
    }

    fn write_i64(&mut self, value: i64) -> Result<&mut Self> {
        (**self).write_i64(value)?;
        Ok(self)
    }

    fn write_f64(&mut self, value: f64) -> Result<&mut Self> {
        (**self).write_f64(value)?;
        Ok(self)
    }

    fn write_bytes(&mut self, data: &[u8], offset: usize, length: usize) -> Result<&mut Self> {
        (**self).write_bytes(data, offset, length)?;
        Ok(self)
    }

    fn flush(&mut self) -> Result<&mut Self> {
        (**self).flush()?;
        Ok(self)
    }

    fn begin_message(&mut self) -> Result<()> {
        (**self).begin_message()
    }

    fn message_succeeded(&mut self) -> Result<()> {
        (**self).message_succeeded()
    }

    fn message_failed(&mut self) -> Result<()> {
        (**self).message_failed()
    }
}
