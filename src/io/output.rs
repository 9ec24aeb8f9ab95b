//! Buffered writes to a blocking byte sink.

use std::io::{self, ErrorKind, Write};

use bytes::{Buf, BufMut, BytesMut};

use super::{MIN_BUFFER_CAPACITY, PackOutput};
use crate::error::{PackStreamError, Result};

/// Accumulates writes in a fixed-capacity buffer and hands them to `W` in
/// bulk, whenever the buffer fills or on [`flush`](PackOutput::flush).
#[derive(Debug)]
pub struct BufferedChannelOutput<W> {
    buffer: BytesMut,
    capacity: usize,
    channel: Option<W>,
}

impl<W: Write> BufferedChannelOutput<W> {
    /// Creates an output with no channel bound; see [`reset`](Self::reset).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_BUFFER_CAPACITY);
        Self {
            buffer: BytesMut::with_capacity(capacity),
            capacity,
            channel: None,
        }
    }

    pub fn with_channel(channel: W, capacity: usize) -> Self {
        let mut output = Self::new(capacity);
        output.channel = Some(channel);
        output
    }

    /// Binds a new channel. Bytes not yet flushed to the old one are dropped.
    pub fn reset(&mut self, channel: W) -> &mut Self {
        if !self.buffer.is_empty() {
            tracing::trace!(
                discarded = self.buffer.len(),
                "rebinding output with unflushed bytes"
            );
        }
        self.buffer.clear();
        self.channel = Some(channel);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes written but not yet flushed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn get_ref(&self) -> Option<&W> {
        self.channel.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut W> {
        self.channel.as_mut()
    }

    /// Flushes and returns the channel.
    pub fn into_inner(mut self) -> Result<Option<W>> {
        self.flush()?;
        Ok(self.channel.take())
    }

    /// Drops buffered bytes and closes the channel, if one is bound.
    pub fn close(&mut self) -> Result<()> {
        self.buffer.clear();
        if let Some(mut channel) = self.channel.take() {
            channel.flush()?;
        }
        Ok(())
    }

    /// Makes room for `n` more bytes.
    fn ensure(&mut self, n: usize) -> Result<()> {
        if self.capacity - self.buffer.len() < n {
            self.drain()?;
        }
        Ok(())
    }

    /// Writes the whole buffer to the channel.
    fn drain(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let Some(channel) = self.channel.as_mut() else {
            return Err(
                io::Error::new(ErrorKind::NotConnected, "no channel bound to output").into(),
            );
        };

        let pending = self.buffer.len();
        while self.buffer.has_remaining() {
            match channel.write(&self.buffer) {
                Ok(0) => {
                    return Err(io::Error::new(
                        ErrorKind::WriteZero,
                        format!("channel accepted no bytes with {} pending", self.buffer.len()),
                    )
                    .into());
                }
                Ok(n) => self.buffer.advance(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        tracing::trace!(bytes = pending, "flushed output buffer");
        self.buffer.clear();
        Ok(())
    }
}

impl<W: Write> PackOutput for BufferedChannelOutput<W> {
    fn write_u8(&mut self, value: u8) -> Result<&mut Self> {
        self.ensure(1)?;
        self.buffer.put_u8(value);
        Ok(self)
    }

    fn write_i16(&mut self, value: i16) -> Result<&mut Self> {
        self.ensure(2)?;
        self.buffer.put_i16(value);
        Ok(self)
    }

    fn write_i32(&mut self, value: i32) -> Result<&mut Self> {
        self.ensure(4)?;
        self.buffer.put_i32(value);
        Ok(self)
    }

    fn write_i64(&mut self, value: i64) -> Result<&mut Self> {
        self.ensure(8)?;
        self.buffer.put_i64(value);
        Ok(self)
    }

    fn write_f64(&mut self, value: f64) -> Result<&mut Self> {
        self.ensure(8)?;
        self.buffer.put_f64(value);
        Ok(self)
    }

    fn write_bytes(&mut self, data: &[u8], offset: usize, length: usize) -> Result<&mut Self> {
        let end = offset
            .checked_add(length)
            .filter(|&end| end <= data.len())
            .ok_or(PackStreamError::Bounds {
                offset,
                length,
                available: data.len(),
            })?;

        let mut src = &data[offset..end];
        while !src.is_empty() {
            let space = self.capacity - self.buffer.len();
            if space == 0 {
                self.drain()?;
                continue;
            }
            let n = space.min(src.len());
            self.buffer.put_slice(&src[..n]);
            src = &src[n..];
        }
        Ok(self)
    }

    fn flush(&mut self) -> Result<&mut Self> {
        self.drain()?;
        if let Some(channel) = self.channel.as_mut() {
            channel.flush()?;
        }
        Ok(self)
    }
}
