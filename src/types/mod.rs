//! PackStream value types.

mod value;

pub use value::{PackMap, PackStruct, PackValue};
