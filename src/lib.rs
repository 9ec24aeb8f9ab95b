//! A pure-Rust PackStream codec over buffered blocking channels.
//!
//! PackStream is the compact, big-endian binary format used by the Bolt
//! protocol to exchange richly-typed values. This crate packs and unpacks
//! those values against any [`std::io::Read`] / [`std::io::Write`] channel
//! through fixed-capacity buffers.
//!
//! # Architecture
//!
//! - **`io`** — Buffered channel input/output and the `PackInput`/`PackOutput` traits
//! - **`packstream`** — Marker table, `Packer` and `Unpacker`
//! - **`types`** — The `PackValue` model for whole-value encode/decode
//! - **`config`** — Buffer sizing
//! - **`dump`** — Human-readable rendering of raw bytes
//!
//! ```
//! use std::io::Cursor;
//! use boltr_packstream::io::{BufferedChannelInput, BufferedChannelOutput};
//! use boltr_packstream::packstream::{Packer, Unpacker};
//!
//! let mut packer = Packer::new(BufferedChannelOutput::with_channel(Vec::new(), 64));
//! packer.pack_list_header(2).unwrap();
//! packer.pack_str("hello").unwrap();
//! packer.pack_i64(42).unwrap();
//! let bytes = packer.into_inner().into_inner().unwrap().unwrap();
//!
//! let mut unpacker = Unpacker::new(BufferedChannelInput::with_channel(Cursor::new(bytes), 64));
//! let value = unpacker.unpack_value().unwrap();
//! assert_eq!(value.to_string(), r#"["hello", 42]"#);
//! ```

pub mod config;
pub mod dump;
pub mod error;
pub mod io;
pub mod packstream;
pub mod types;

pub use error::{PackStreamError, Result};
