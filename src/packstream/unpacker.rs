//! PackStream decoding: `PackInput` → typed values.

use super::{Length, PackType, marker};
use crate::error::{PackStreamError, Result};
use crate::io::PackInput;
use crate::types::{PackMap, PackStruct, PackValue};

/// Upper bound on elements reserved ahead of decoding a container.
const PREALLOC_LIMIT: usize = 1024;

/// Raw payloads are read in pieces of at most this size, so a hostile
/// length cannot force a huge allocation before any data arrives.
const READ_CHUNK: usize = 64 * 1024;

const DISCARD_CHUNK: usize = 256;

/// Deepest container nesting accepted by [`Unpacker::unpack_value`].
pub const MAX_DEPTH: usize = 256;

/// Reads PackStream values from an input.
///
/// Each typed method consumes exactly one marker (plus its payload) and fails
/// with [`PackStreamError::Unexpected`] if the marker announces a different
/// kind of value. Use [`peek_next_type`](Self::peek_next_type) to dispatch on
/// the upcoming value without consuming it.
pub struct Unpacker<I> {
    input: I,
}

impl<I: PackInput> Unpacker<I> {
    pub fn new(input: I) -> Self {
        Self { input }
    }

    pub fn get_ref(&self) -> &I {
        &self.input
    }

    pub fn get_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn into_inner(self) -> I {
        self.input
    }

    /// Returns `true` if another value can start.
    pub fn has_next(&mut self) -> Result<bool> {
        self.input.has_more_data()
    }

    pub fn peek_next_type(&mut self) -> Result<PackType> {
        Ok(PackType::of(self.input.peek_u8()?))
    }

    /// Decodes one complete value of any type.
    ///
    /// Containers may nest at most [`MAX_DEPTH`] levels deep; deeper input
    /// fails with [`PackStreamError::Overflow`].
    pub fn unpack_value(&mut self) -> Result<PackValue> {
        self.value_at(0)
    }

    pub fn unpack_list(&mut self) -> Result<Vec<PackValue>> {
        self.list_at(0)
    }

    pub fn unpack_map(&mut self) -> Result<PackMap> {
        self.map_at(0)
    }

    pub fn unpack_struct(&mut self) -> Result<PackStruct> {
        self.struct_at(0)
    }

    fn value_at(&mut self, depth: usize) -> Result<PackValue> {
        if depth > MAX_DEPTH {
            return Err(PackStreamError::overflow(format!(
                "values nested deeper than {MAX_DEPTH} levels"
            )));
        }
        match self.peek_next_type()? {
            PackType::Null => {
                self.unpack_null()?;
                Ok(PackValue::Null)
            }
            PackType::Boolean => self.unpack_bool().map(PackValue::Boolean),
            PackType::Integer => self.unpack_i64().map(PackValue::Integer),
            PackType::Float => self.unpack_f64().map(PackValue::Float),
            PackType::String => self.unpack_string().map(PackValue::String),
            PackType::Bytes => self.unpack_bytes().map(PackValue::Bytes),
            PackType::List => self.list_at(depth).map(PackValue::List),
            PackType::Map => self.map_at(depth).map(PackValue::Map),
            PackType::Struct => self.struct_at(depth).map(PackValue::Struct),
            PackType::EndOfStream | PackType::Reserved => {
                Err(PackStreamError::UnexpectedMarker(self.input.read_u8()?))
            }
        }
    }

    fn list_at(&mut self, depth: usize) -> Result<Vec<PackValue>> {
        match self.unpack_list_header()? {
            Length::Known(len) => {
                let mut items = Vec::with_capacity(len.min(PREALLOC_LIMIT));
                for _ in 0..len {
                    items.push(self.value_at(depth + 1)?);
                }
                Ok(items)
            }
            Length::Streamed => {
                let mut items = Vec::new();
                while !self.at_end_of_stream()? {
                    items.push(self.value_at(depth + 1)?);
                }
                self.unpack_end_of_stream()?;
                Ok(items)
            }
        }
    }

    fn map_at(&mut self, depth: usize) -> Result<PackMap> {
        match self.unpack_map_header()? {
            Length::Known(len) => {
                let mut entries = PackMap::with_capacity(len.min(PREALLOC_LIMIT));
                for _ in 0..len {
                    let key = self.unpack_string()?;
                    entries.push((key, self.value_at(depth + 1)?));
                }
                Ok(entries)
            }
            Length::Streamed => {
                let mut entries = PackMap::new();
                while !self.at_end_of_stream()? {
                    let key = self.unpack_string()?;
                    entries.push((key, self.value_at(depth + 1)?));
                }
                self.unpack_end_of_stream()?;
                Ok(entries)
            }
        }
    }

    fn struct_at(&mut self, depth: usize) -> Result<PackStruct> {
        let len = self.unpack_struct_header()?;
        let signature = self.unpack_struct_signature()?;
        let mut fields = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        for _ in 0..len {
            fields.push(self.value_at(depth + 1)?);
        }
        Ok(PackStruct { signature, fields })
    }

    pub fn unpack_null(&mut self) -> Result<()> {
        let m = self.input.read_u8()?;
        if m != marker::NULL {
            return Err(PackStreamError::unexpected(PackType::Null, m));
        }
        Ok(())
    }

    pub fn unpack_bool(&mut self) -> Result<bool> {
        match self.input.read_u8()? {
            marker::TRUE => Ok(true),
            marker::FALSE => Ok(false),
            m => Err(PackStreamError::unexpected(PackType::Boolean, m)),
        }
    }

    pub fn unpack_i64(&mut self) -> Result<i64> {
        let m = self.input.read_u8()?;
        // TINY_INT: 0x00..=0x7F and 0xF0..=0xFF, sign-extended
        if i64::from(m as i8) >= marker::TINY_INT_MIN {
            return Ok(i64::from(m as i8));
        }
        match m {
            marker::INT_8 => Ok(i64::from(self.input.read_u8()? as i8)),
            marker::INT_16 => Ok(i64::from(self.input.read_i16()?)),
            marker::INT_32 => Ok(i64::from(self.input.read_i32()?)),
            marker::INT_64 => self.input.read_i64(),
            _ => Err(PackStreamError::unexpected(PackType::Integer, m)),
        }
    }

    /// Like [`unpack_i64`](Self::unpack_i64), for values that must fit an `i32`.
    pub fn unpack_i32(&mut self) -> Result<i32> {
        let value = self.unpack_i64()?;
        i32::try_from(value).map_err(|_| {
            PackStreamError::overflow(format!("integer {value} is out of range for a 32-bit value"))
        })
    }

    pub fn unpack_f64(&mut self) -> Result<f64> {
        let m = self.input.read_u8()?;
        if m != marker::FLOAT_64 {
            return Err(PackStreamError::unexpected(PackType::Float, m));
        }
        self.input.read_f64()
    }

    pub fn unpack_string(&mut self) -> Result<String> {
        Ok(String::from_utf8(self.unpack_utf8()?)?)
    }

    /// Returns the raw payload of a string without validating it.
    pub fn unpack_utf8(&mut self) -> Result<Vec<u8>> {
        let len = self.unpack_string_header()?;
        self.read_payload(len)
    }

    /// Copies up to `dst.len()` bytes of a string payload into `dst` and
    /// skips the rest. Returns the declared size.
    pub fn unpack_utf8_into(&mut self, dst: &mut [u8]) -> Result<usize> {
        let len = self.unpack_string_header()?;
        self.read_payload_into(len, dst)?;
        Ok(len)
    }

    pub fn unpack_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.unpack_bytes_header()?;
        self.read_payload(len)
    }

    /// Copies up to `dst.len()` bytes of a byte array into `dst` and skips
    /// the rest. Returns the declared size.
    pub fn unpack_bytes_into(&mut self, dst: &mut [u8]) -> Result<usize> {
        let len = self.unpack_bytes_header()?;
        self.read_payload_into(len, dst)?;
        Ok(len)
    }

    pub fn unpack_string_header(&mut self) -> Result<usize> {
        let m = self.input.read_u8()?;
        match m {
            0x80..=0x8F => Ok(marker::tiny_size(m)),
            marker::STRING_8 => self.uint8(),
            marker::STRING_16 => self.uint16(),
            marker::STRING_32 => self.uint32("string"),
            _ => Err(PackStreamError::unexpected(PackType::String, m)),
        }
    }

    pub fn unpack_bytes_header(&mut self) -> Result<usize> {
        let m = self.input.read_u8()?;
        match m {
            marker::BYTES_8 => self.uint8(),
            marker::BYTES_16 => self.uint16(),
            marker::BYTES_32 => self.uint32("byte array"),
            _ => Err(PackStreamError::unexpected(PackType::Bytes, m)),
        }
    }

    pub fn unpack_list_header(&mut self) -> Result<Length> {
        let m = self.input.read_u8()?;
        let len = match m {
            0x90..=0x9F => marker::tiny_size(m),
            marker::LIST_8 => self.uint8()?,
            marker::LIST_16 => self.uint16()?,
            marker::LIST_32 => self.uint32("list")?,
            marker::LIST_STREAM => return Ok(Length::Streamed),
            _ => return Err(PackStreamError::unexpected(PackType::List, m)),
        };
        Ok(Length::Known(len))
    }

    pub fn unpack_map_header(&mut self) -> Result<Length> {
        let m = self.input.read_u8()?;
        let len = match m {
            0xA0..=0xAF => marker::tiny_size(m),
            marker::MAP_8 => self.uint8()?,
            marker::MAP_16 => self.uint16()?,
            marker::MAP_32 => self.uint32("map")?,
            marker::MAP_STREAM => return Ok(Length::Streamed),
            _ => return Err(PackStreamError::unexpected(PackType::Map, m)),
        };
        Ok(Length::Known(len))
    }

    /// Reads a structure's field count. The signature byte follows; read it
    /// with [`unpack_struct_signature`](Self::unpack_struct_signature).
    pub fn unpack_struct_header(&mut self) -> Result<usize> {
        let m = self.input.read_u8()?;
        match m {
            0xB0..=0xBF => Ok(marker::tiny_size(m)),
            marker::STRUCT_8 => self.uint8(),
            marker::STRUCT_16 => self.uint16(),
            _ => Err(PackStreamError::unexpected(PackType::Struct, m)),
        }
    }

    pub fn unpack_struct_signature(&mut self) -> Result<u8> {
        self.input.read_u8()
    }

    pub fn unpack_end_of_stream(&mut self) -> Result<()> {
        let m = self.input.read_u8()?;
        if m != marker::END_OF_STREAM {
            return Err(PackStreamError::unexpected(PackType::EndOfStream, m));
        }
        Ok(())
    }

    fn at_end_of_stream(&mut self) -> Result<bool> {
        Ok(self.peek_next_type()? == PackType::EndOfStream)
    }

    fn uint8(&mut self) -> Result<usize> {
        Ok(usize::from(self.input.read_u8()?))
    }

    fn uint16(&mut self) -> Result<usize> {
        Ok(usize::from(self.input.read_i16()? as u16))
    }

    fn uint32(&mut self, kind: &str) -> Result<usize> {
        let raw = self.input.read_i32()? as u32;
        if raw > i32::MAX as u32 {
            return Err(PackStreamError::overflow(format!(
                "{kind} of size {raw} is too long to unpack"
            )));
        }
        Ok(raw as usize)
    }

    fn read_payload(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(len.min(READ_CHUNK));
        while data.len() < len {
            let start = data.len();
            let end = start + (len - start).min(READ_CHUNK);
            data.resize(end, 0);
            self.read_part(&mut data[start..end], len, len - end)?;
        }
        Ok(data)
    }

    fn read_payload_into(&mut self, len: usize, dst: &mut [u8]) -> Result<()> {
        let copied = len.min(dst.len());
        self.read_part(&mut dst[..copied], len, len - copied)?;

        let mut left = len - copied;
        let mut scratch = [0u8; DISCARD_CHUNK];
        while left > 0 {
            let n = left.min(DISCARD_CHUNK);
            left -= n;
            self.read_part(&mut scratch[..n], len, left)?;
        }
        Ok(())
    }

    /// Reads one piece of a `len`-byte payload with `after` bytes still to
    /// follow. A short read is reported against the whole payload.
    fn read_part(&mut self, into: &mut [u8], len: usize, after: usize) -> Result<()> {
        self.input.read_bytes(into).map_err(|e| match e {
            PackStreamError::EndOfStream {
                expected,
                available,
            } => {
                let missing = expected.saturating_sub(available) + after;
                PackStreamError::end_of_stream(len, len.saturating_sub(missing))
            }
            other => other,
        })
    }
}
