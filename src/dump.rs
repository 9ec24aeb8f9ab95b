//! Human-readable rendering of raw PackStream bytes.
//!
//! Handy for inspecting captured traffic:
//!
//! ```
//! let hex = "B2 01 8C 4D 79 43 6C 69 65 6E 74 2F 31 2E 30 A0";
//! let text = boltr_packstream::dump::dump_hex(hex).unwrap();
//! assert_eq!(text, "Struct(0x01) [\"MyClient/1.0\", {}]");
//! ```

use std::io::Cursor;

use crate::config::DEFAULT_BUFFER_CAPACITY;
use crate::error::PackStreamError;
use crate::io::BufferedChannelInput;
use crate::packstream::Unpacker;

#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Decoding failed. `value_offset` is where the failing top-level value
    /// started, `offset` is how far decoding got.
    #[error("cannot decode value at byte {value_offset} (stopped at byte {offset}): {source}")]
    Decode {
        value_offset: u64,
        offset: u64,
        #[source]
        source: PackStreamError,
    },
}

/// Parses hex text, ignoring any whitespace between digits.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, DumpError> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(hex::decode(digits)?)
}

/// Decodes every top-level value in hex text and renders one per line.
pub fn dump_hex(text: &str) -> Result<String, DumpError> {
    dump_bytes(&parse_hex(text)?)
}

/// Decodes every top-level value in `data` and renders one per line.
pub fn dump_bytes(data: &[u8]) -> Result<String, DumpError> {
    let input = BufferedChannelInput::with_channel(Cursor::new(data), DEFAULT_BUFFER_CAPACITY);
    let mut unpacker = Unpacker::new(input);
    let mut lines = Vec::new();

    loop {
        let value_offset = unpacker.get_ref().bytes_consumed();
        let decoded = match unpacker.has_next() {
            Ok(false) => break,
            Ok(true) => unpacker.unpack_value(),
            Err(e) => Err(e),
        };
        match decoded {
            Ok(value) => lines.push(value.to_string()),
            Err(source) => {
                let offset = unpacker.get_ref().bytes_consumed();
                tracing::debug!(value_offset, offset, error = %source, "dump stopped");
                return Err(DumpError::Decode {
                    value_offset,
                    offset,
                    source,
                });
            }
        }
    }

    Ok(lines.join("\n"))
}
