//! Stream codecs for a compact tagged binary format and lenient JSON.
//!
//! Both formats expose the same call sequence through the [`Writer`] and
//! [`Reader`] traits, so a value's codec is written once against
//! [`Encode`]/[`Decode`] and works with either. Each reader and writer runs
//! over a single buffer, a list of chunks, or a blocking stream with the
//! same behavior; see [`store`].
//!
//! ```rust
//! use dualconv::{BinaryConvert, JsonConvert};
//!
//! let values = vec![i64::MIN, 0, 42];
//!
//! let bytes = BinaryConvert::new().convert_to(&values)?;
//! assert_eq!(BinaryConvert::new().convert_from::<Vec<i64>>(bytes)?, values);
//!
//! let text = JsonConvert::new().convert_to(&values)?;
//! assert_eq!(text, "[-9223372036854775808,0,42]");
//! # Ok::<(), dualconv::ConvertError>(())
//! ```
//!
//! Binary fields carry a [`WireTag`], which lets a reader skip fields it
//! does not recognize without knowing their type. JSON fields are skipped
//! by structure alone.

#![allow(missing_docs)]
// Every fallible call returns `ConvertError` carrying the failing position.
#![allow(clippy::missing_errors_doc)]

mod binary;
mod codec;
mod digits;
mod error;
mod escape_buffer;
mod field;
mod json;
mod leaf;
mod options;
mod pool;
pub mod store;
pub mod utf8;
pub mod wire;

#[cfg(test)]
mod tests;

pub use binary::{BinaryConvert, BinaryReader, BinaryWriter};
pub use codec::{ArrayLength, Decode, Encode, Reader, Writer};
pub use error::{ConvertError, ErrorSource, FormatError, Result};
pub use field::Field;
pub use json::{JsonConvert, JsonReader, JsonWriter};
pub use options::{ConvertOptions, PoolOptions, ReaderOptions, WriterOptions};
pub use pool::{Pool, Pooled};
pub use store::Recycle;
pub use wire::WireTag;
