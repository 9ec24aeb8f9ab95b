//! Buffered exact reads over a blocking byte source.

use std::io::{ErrorKind, Read};

use bytes::Buf;

use super::{MIN_BUFFER_CAPACITY, PackInput};
use crate::error::{PackStreamError, Result};

/// Consecutive reads that may fail with `Interrupted` or `WouldBlock`
/// before the source is treated as exhausted.
pub const MAX_STALLED_READS: usize = 16;

/// Serves exact-size reads from a fixed-capacity buffer refilled from `R`.
///
/// Unread bytes are never discarded: when a read needs more than is
/// buffered, the unread tail is moved to the front of the buffer and the
/// free space behind it is filled from the channel. A source returning
/// `Ok(0)` is exhausted; running short is reported as
/// [`PackStreamError::EndOfStream`].
pub struct BufferedChannelInput<R> {
    buffer: Box<[u8]>,
    position: usize,
    limit: usize,
    consumed: u64,
    channel: Option<R>,
}

impl<R: Read> BufferedChannelInput<R> {
    /// Creates an input with no channel bound; see [`reset`](Self::reset).
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity.max(MIN_BUFFER_CAPACITY)].into_boxed_slice(),
            position: 0,
            limit: 0,
            consumed: 0,
            channel: None,
        }
    }

    pub fn with_channel(channel: R, capacity: usize) -> Self {
        let mut input = Self::new(capacity);
        input.channel = Some(channel);
        input
    }

    /// Binds a new channel, discarding anything buffered from the old one.
    pub fn reset(&mut self, channel: R) -> &mut Self {
        if self.position < self.limit {
            tracing::trace!(
                discarded = self.limit - self.position,
                "rebinding input with unread bytes"
            );
        }
        self.channel = Some(channel);
        self.position = 0;
        self.limit = 0;
        self.consumed = 0;
        self
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes buffered but not yet read.
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    /// Total bytes handed out since construction or the last `reset`.
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    pub fn get_ref(&self) -> Option<&R> {
        self.channel.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut R> {
        self.channel.as_mut()
    }

    /// Unbinds and returns the channel. Buffered bytes are lost.
    pub fn into_inner(self) -> Option<R> {
        self.channel
    }

    /// Makes at least `n` bytes available, returning `false` if the channel
    /// runs dry first. `n` must not exceed the capacity.
    fn ensure(&mut self, n: usize) -> Result<bool> {
        debug_assert!(n <= self.capacity());
        if self.remaining() >= n {
            return Ok(true);
        }
        self.compact();
        self.fill(n)?;
        Ok(self.remaining() >= n)
    }

    fn require(&mut self, n: usize) -> Result<()> {
        if self.ensure(n)? {
            Ok(())
        } else {
            Err(PackStreamError::end_of_stream(n, self.remaining()))
        }
    }

    fn compact(&mut self) {
        if self.position == self.limit {
            self.position = 0;
            self.limit = 0;
        } else if self.position > 0 {
            self.buffer.copy_within(self.position..self.limit, 0);
            self.limit -= self.position;
            self.position = 0;
        }
    }

    /// Reads until `target` bytes are buffered or the channel is exhausted.
    fn fill(&mut self, target: usize) -> Result<()> {
        let Some(channel) = self.channel.as_mut() else {
            return Ok(());
        };

        let mut stalls = 0;
        while self.limit < target {
            match channel.read(&mut self.buffer[self.limit..]) {
                Ok(0) => break,
                Ok(n) => {
                    self.limit += n;
                    stalls = 0;
                }
                Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {
                    stalls += 1;
                    if stalls >= MAX_STALLED_READS {
                        tracing::trace!(stalls, "channel made no progress, treating as exhausted");
                        break;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::trace!(buffered = self.limit, target, "refilled input buffer");
        Ok(())
    }

    /// Consumes `n` buffered bytes, refilling first if needed.
    fn take(&mut self, n: usize) -> Result<&[u8]> {
        self.require(n)?;
        let start = self.position;
        self.advance(n);
        Ok(&self.buffer[start..start + n])
    }

    fn advance(&mut self, n: usize) {
        self.position += n;
        self.consumed += n as u64;
    }
}

impl<R: Read> PackInput for BufferedChannelInput<R> {
    fn has_more_data(&mut self) -> Result<bool> {
        self.ensure(1)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?.get_u8())
    }

    fn read_i16(&mut self) -> Result<i16> {
        Ok(self.take(2)?.get_i16())
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(self.take(4)?.get_i32())
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(self.take(8)?.get_i64())
    }

    fn read_f64(&mut self) -> Result<f64> {
        Ok(self.take(8)?.get_f64())
    }

    fn read_bytes(&mut self, into: &mut [u8]) -> Result<()> {
        let total = into.len();
        let mut copied = 0;
        while copied < total {
            let needed = total - copied;
            if self.remaining() == 0 && !self.ensure(needed.min(self.capacity()))? {
                return Err(PackStreamError::end_of_stream(needed, self.remaining()));
            }
            let n = self.remaining().min(needed);
            into[copied..copied + n]
                .copy_from_slice(&self.buffer[self.position..self.position + n]);
            self.advance(n);
            copied += n;
        }
        Ok(())
    }

    fn peek_u8(&mut self) -> Result<u8> {
        self.require(1)?;
        Ok(self.buffer[self.position])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    /// Hands out at most `step` bytes per read.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
        reads: usize,
    }

    impl Trickle {
        fn new(data: Vec<u8>, step: usize) -> Self {
            Self {
                data,
                pos: 0,
                step,
                reads: 0,
            }
        }
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    /// Never makes progress.
    struct Stalled {
        kind: ErrorKind,
        reads: usize,
    }

    impl Read for Stalled {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            Err(io::Error::from(self.kind))
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::ConnectionReset, "peer reset"))
        }
    }

    fn input(data: &[u8], capacity: usize) -> BufferedChannelInput<Cursor<Vec<u8>>> {
        BufferedChannelInput::with_channel(Cursor::new(data.to_vec()), capacity)
    }

    #[test]
    fn reads_big_endian_primitives() {
        let mut data = vec![0x7F];
        data.extend_from_slice(&(-2i16).to_be_bytes());
        data.extend_from_slice(&0x0102_0304i32.to_be_bytes());
        data.extend_from_slice(&i64::MIN.to_be_bytes());
        data.extend_from_slice(&1.5f64.to_be_bytes());

        let mut input = input(&data, 64);
        assert_eq!(input.read_u8().unwrap(), 0x7F);
        assert_eq!(input.read_i16().unwrap(), -2);
        assert_eq!(input.read_i32().unwrap(), 0x0102_0304);
        assert_eq!(input.read_i64().unwrap(), i64::MIN);
        assert_eq!(input.read_f64().unwrap(), 1.5);
        assert!(!input.has_more_data().unwrap());
        assert_eq!(input.bytes_consumed(), data.len() as u64);
    }

    #[test]
    fn values_straddling_the_buffer_edge() {
        // [mkr][8 data][mkr][8 data] against an 11-byte buffer.
        let mut data = Vec::new();
        for _ in 0..2 {
            data.push(0xCB);
            data.extend_from_slice(&i64::MAX.to_be_bytes());
        }

        let mut input = input(&data, 11);
        assert_eq!(input.read_u8().unwrap(), 0xCB);
        assert_eq!(input.read_i64().unwrap(), i64::MAX);
        assert_eq!(input.read_u8().unwrap(), 0xCB);
        assert_eq!(input.read_i64().unwrap(), i64::MAX);
    }

    #[test]
    fn compaction_keeps_unread_tail() {
        let data: Vec<u8> = (0..20).collect();
        let mut input = BufferedChannelInput::with_channel(Trickle::new(data, 5), 8);

        assert_eq!(input.read_u8().unwrap(), 0);
        // Four bytes are buffered; an i64 forces a compact-and-refill.
        let value = input.read_i64().unwrap();
        assert_eq!(value, i64::from_be_bytes([1, 2, 3, 4, 5, 6, 7, 8]));
        assert_eq!(input.read_u8().unwrap(), 9);
    }

    #[test]
    fn read_bytes_larger_than_capacity() {
        let data: Vec<u8> = (0..=255).collect();
        let mut input = input(&data, 8);
        input.read_u8().unwrap();

        let mut out = vec![0u8; 200];
        input.read_bytes(&mut out).unwrap();
        assert_eq!(&out[..], &data[1..201]);
        assert_eq!(input.read_u8().unwrap(), 201);
    }

    #[test]
    fn read_bytes_from_trickling_source() {
        let data: Vec<u8> = (0..100).collect();
        let mut input = BufferedChannelInput::with_channel(Trickle::new(data.clone(), 3), 16);

        let mut out = vec![0u8; 100];
        input.read_bytes(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn short_read_bytes_is_end_of_stream() {
        let mut input = input(&[1, 2, 3, 4, 5], 8);
        let mut out = [0u8; 10];
        let err = input.read_bytes(&mut out).unwrap_err();
        assert!(err.is_end_of_stream(), "got {err}");
    }

    #[test]
    fn short_fixed_read_is_end_of_stream() {
        let mut input = input(&[0x00, 0x01, 0x02], 8);
        match input.read_i32().unwrap_err() {
            PackStreamError::EndOfStream {
                expected,
                available,
            } => {
                assert_eq!(expected, 4);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn peek_does_not_consume() {
        let mut input = input(&[0xC3, 0xC2], 8);
        for _ in 0..5 {
            assert_eq!(input.peek_u8().unwrap(), 0xC3);
        }
        assert_eq!(input.read_u8().unwrap(), 0xC3);
        assert_eq!(input.peek_u8().unwrap(), 0xC2);
        assert_eq!(input.bytes_consumed(), 1);
    }

    #[test]
    fn stalled_source_is_exhausted_after_bounded_retries() {
        for kind in [ErrorKind::Interrupted, ErrorKind::WouldBlock] {
            let mut input = BufferedChannelInput::with_channel(Stalled { kind, reads: 0 }, 8);
            assert!(input.read_u8().unwrap_err().is_end_of_stream());
            assert_eq!(input.get_ref().unwrap().reads, MAX_STALLED_READS);
        }
    }

    #[test]
    fn channel_errors_propagate() {
        let mut input = BufferedChannelInput::with_channel(Broken, 8);
        match input.read_u8().unwrap_err() {
            PackStreamError::Io(e) => assert_eq!(e.kind(), ErrorKind::ConnectionReset),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unbound_input_is_empty() {
        let mut input: BufferedChannelInput<Cursor<Vec<u8>>> = BufferedChannelInput::new(8);
        assert!(!input.has_more_data().unwrap());
        assert!(input.read_u8().unwrap_err().is_end_of_stream());
    }

    #[test]
    fn reset_discards_buffered_bytes() {
        let mut input = input(&[1, 2, 3, 4], 8);
        assert_eq!(input.read_u8().unwrap(), 1);

        input.reset(Cursor::new(vec![9]));
        assert_eq!(input.bytes_consumed(), 0);
        assert_eq!(input.read_u8().unwrap(), 9);
        assert!(!input.has_more_data().unwrap());
    }

    #[test]
    fn capacity_is_clamped_to_widest_value() {
        let mut input = input(&i64::MAX.to_be_bytes(), 1);
        assert_eq!(input.capacity(), MIN_BUFFER_CAPACITY);
        assert_eq!(input.read_i64().unwrap(), i64::MAX);
    }

    #[test]
    fn buffered_data_avoids_channel_reads() {
        let data: Vec<u8> = (0..8).collect();
        let mut input = BufferedChannelInput::with_channel(Trickle::new(data, 8), 8);
        input.read_u8().unwrap();
        let reads = input.get_ref().unwrap().reads;
        for _ in 1..8 {
            input.read_u8().unwrap();
        }
        assert_eq!(input.get_ref().unwrap().reads, reads);
    }
}
