//! PackStream encoding: typed values → `PackOutput`.

use super::marker;
use crate::error::{PackStreamError, Result};
use crate::io::PackOutput;
use crate::types::{PackStruct, PackValue};

const MAX_8: usize = i8::MAX as usize;
const MAX_16: usize = i16::MAX as usize;
const MAX_32: usize = i32::MAX as usize;

/// Writes PackStream values to an output, choosing the most compact marker
/// for each one.
///
/// Header methods write only the marker and size; the caller then packs
/// exactly that many elements. This lets large containers be streamed
/// without materialising them first.
pub struct Packer<O> {
    out: O,
}

impl<O: PackOutput> Packer<O> {
    pub fn new(out: O) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &O {
        &self.out
    }

    pub fn get_mut(&mut self) -> &mut O {
        &mut self.out
    }

    pub fn into_inner(self) -> O {
        self.out
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn begin_message(&mut self) -> Result<()> {
        self.out.begin_message()
    }

    pub fn message_succeeded(&mut self) -> Result<()> {
        self.out.message_succeeded()
    }

    pub fn message_failed(&mut self) -> Result<()> {
        self.out.message_failed()
    }

    /// Packs a whole value, recursing into containers.
    pub fn pack_value(&mut self, value: &PackValue) -> Result<()> {
        match value {
            PackValue::Null => self.pack_null(),
            PackValue::Boolean(b) => self.pack_bool(*b),
            PackValue::Integer(i) => self.pack_i64(*i),
            PackValue::Float(f) => self.pack_f64(*f),
            PackValue::String(s) => self.pack_str(s),
            PackValue::Bytes(b) => self.pack_bytes(b),
            PackValue::List(items) => {
                self.pack_list_header(items.len())?;
                for item in items {
                    self.pack_value(item)?;
                }
                Ok(())
            }
            PackValue::Map(entries) => {
                self.pack_map_header(entries.len())?;
                for (key, value) in entries {
                    self.pack_str(key)?;
                    self.pack_value(value)?;
                }
                Ok(())
            }
            PackValue::Struct(s) => self.pack_struct(s),
        }
    }

    pub fn pack_struct(&mut self, s: &PackStruct) -> Result<()> {
        self.pack_struct_header(s.fields.len(), s.signature)?;
        for field in &s.fields {
            self.pack_value(field)?;
        }
        Ok(())
    }

    pub fn pack_null(&mut self) -> Result<()> {
        self.out.write_u8(marker::NULL)?;
        Ok(())
    }

    pub fn pack_bool(&mut self, value: bool) -> Result<()> {
        self.out.write_u8(if value { marker::TRUE } else { marker::FALSE })?;
        Ok(())
    }

    /// Packs an integer using the smallest possible representation.
    pub fn pack_i64(&mut self, value: i64) -> Result<()> {
        if (marker::TINY_INT_MIN..=marker::TINY_INT_MAX).contains(&value) {
            // TINY_INT: single byte
            self.out.write_u8(value as u8)?;
        } else if i64::from(i8::MIN) <= value && value <= i64::from(i8::MAX) {
            self.out.write_u8(marker::INT_8)?.write_u8(value as u8)?;
        } else if i64::from(i16::MIN) <= value && value <= i64::from(i16::MAX) {
            self.out.write_u8(marker::INT_16)?.write_i16(value as i16)?;
        } else if i64::from(i32::MIN) <= value && value <= i64::from(i32::MAX) {
            self.out.write_u8(marker::INT_32)?.write_i32(value as i32)?;
        } else {
            self.out.write_u8(marker::INT_64)?.write_i64(value)?;
        }
        Ok(())
    }

    pub fn pack_f64(&mut self, value: f64) -> Result<()> {
        self.out.write_u8(marker::FLOAT_64)?.write_f64(value)?;
        Ok(())
    }

    /// Packs a string (size = byte length, not char count).
    pub fn pack_str(&mut self, value: &str) -> Result<()> {
        self.pack_utf8(value.as_bytes())
    }

    /// Packs bytes that the caller guarantees are valid UTF-8.
    pub fn pack_utf8(&mut self, utf8: &[u8]) -> Result<()> {
        self.pack_string_header(utf8.len())?;
        self.out.write_bytes(utf8, 0, utf8.len())?;
        Ok(())
    }

    pub fn pack_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.pack_bytes_header(value.len())?;
        self.out.write_bytes(value, 0, value.len())?;
        Ok(())
    }

    pub fn pack_string_header(&mut self, size: usize) -> Result<()> {
        self.pack_header(
            "string",
            size,
            Some(marker::TINY_STRING_NIBBLE),
            [marker::STRING_8, marker::STRING_16, marker::STRING_32],
        )
    }

    /// Byte arrays have no tiny form; the smallest header is two bytes.
    pub fn pack_bytes_header(&mut self, size: usize) -> Result<()> {
        self.pack_header(
            "byte array",
            size,
            None,
            [marker::BYTES_8, marker::BYTES_16, marker::BYTES_32],
        )
    }

    pub fn pack_list_header(&mut self, size: usize) -> Result<()> {
        self.pack_header(
            "list",
            size,
            Some(marker::TINY_LIST_NIBBLE),
            [marker::LIST_8, marker::LIST_16, marker::LIST_32],
        )
    }

    pub fn pack_map_header(&mut self, size: usize) -> Result<()> {
        self.pack_header(
            "map",
            size,
            Some(marker::TINY_MAP_NIBBLE),
            [marker::MAP_8, marker::MAP_16, marker::MAP_32],
        )
    }

    /// Packs a structure header: size marker, then the signature byte.
    pub fn pack_struct_header(&mut self, size: usize, signature: u8) -> Result<()> {
        if size < marker::TINY_SIZE_LIMIT {
            self.out
                .write_u8(marker::TINY_STRUCT_NIBBLE | size as u8)?
                .write_u8(signature)?;
        } else if size <= MAX_8 {
            self.out
                .write_u8(marker::STRUCT_8)?
                .write_u8(size as u8)?
                .write_u8(signature)?;
        } else if size <= MAX_16 {
            self.out
                .write_u8(marker::STRUCT_16)?
                .write_i16(size as i16)?
                .write_u8(signature)?;
        } else {
            return Err(PackStreamError::overflow(format!(
                "structures cannot have more than {MAX_16} fields, got {size}"
            )));
        }
        Ok(())
    }

    /// Starts a list of unknown length; end it with
    /// [`pack_end_of_stream`](Self::pack_end_of_stream).
    pub fn pack_list_stream_header(&mut self) -> Result<()> {
        self.out.write_u8(marker::LIST_STREAM)?;
        Ok(())
    }

    /// Starts a map of unknown length; end it with
    /// [`pack_end_of_stream`](Self::pack_end_of_stream).
    pub fn pack_map_stream_header(&mut self) -> Result<()> {
        self.out.write_u8(marker::MAP_STREAM)?;
        Ok(())
    }

    pub fn pack_end_of_stream(&mut self) -> Result<()> {
        self.out.write_u8(marker::END_OF_STREAM)?;
        Ok(())
    }

    fn pack_header(
        &mut self,
        kind: &str,
        size: usize,
        tiny: Option<u8>,
        [m8, m16, m32]: [u8; 3],
    ) -> Result<()> {
        match tiny {
            Some(nibble) if size < marker::TINY_SIZE_LIMIT => {
                self.out.write_u8(nibble | size as u8)?;
            }
            _ if size <= MAX_8 => {
                self.out.write_u8(m8)?.write_u8(size as u8)?;
            }
            _ if size <= MAX_16 => {
                self.out.write_u8(m16)?.write_i16(size as i16)?;
            }
            _ if size <= MAX_32 => {
                self.out.write_u8(m32)?.write_i32(size as i32)?;
            }
            _ => {
                return Err(PackStreamError::overflow(format!(
                    "{kind} of size {size} exceeds the maximum of {MAX_32}"
                )));
            }
        }
        Ok(())
    }
}
