//! JSON text.
//!
//! The writer always emits strict JSON. The reader is lenient: it accepts
//! either quote style, unquoted scalars, quoted numbers and any
//! capitalization of `null`. JSON carries no type tags, so unknown fields
//! are skipped purely by structure.

mod convert;
mod reader;
mod writer;

pub use convert::JsonConvert;
pub use reader::JsonReader;
pub use writer::JsonWriter;
