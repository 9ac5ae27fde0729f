//! The compact tagged binary format.
//!
//! Every field is written as a has-next flag, its alias and a one-byte
//! [`WireTag`](crate::WireTag), so a reader can skip fields it does not
//! know about without the declaring type. Objects are bracketed by the
//! `0xBB`/`0xEE` sentinels and all integers are big-endian.

mod convert;
mod reader;
mod writer;

pub use convert::BinaryConvert;
pub use reader::BinaryReader;
pub use writer::BinaryWriter;
