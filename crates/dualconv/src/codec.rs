//! The seam between the stream engines and the codecs built on top of them.
//!
//! [`Writer`] and [`Reader`] expose the same call sequence for both formats.
//! A type's codec drives them through [`Encode`] and [`Decode`] and never
//! needs to know whether it is producing tagged binary or JSON text.
//!
//! Objects are decoded with the loop below; `read_blank` consumes the JSON
//! `:` and is a no-op in binary, `read_object_end` validates the binary end
//! sentinel and is a no-op in JSON (`has_next` already consumed the `}`).
//!
//! ```
//! # use dualconv::{Decode, Field, Reader, Result, WireTag};
//! struct Point { x: i32, y: i32 }
//!
//! static FIELDS: [Field; 2] = [Field::new("x", WireTag::Int), Field::new("y", WireTag::Int)];
//!
//! impl Decode for Point {
//!     fn decode<R: Reader + ?Sized>(input: &mut R) -> Result<Self> {
//!         let mut point = Point { x: 0, y: 0 };
//!         if input.read_object_begin()?.is_none() {
//!             return Ok(point);
//!         }
//!         while input.has_next()? {
//!             let field = input.read_field_index(&FIELDS)?;
//!             input.read_blank()?;
//!             match field {
//!                 Some(0) => point.x = input.read_int()?,
//!                 Some(1) => point.y = input.read_int()?,
//!                 _ => input.skip_value()?,
//!             }
//!         }
//!         input.read_object_end()?;
//!         Ok(point)
//!     }
//! }
//!
//! let mut reader = dualconv::JsonReader::new("{y: 2, 'x': '1'}");
//! let point = Point::decode(&mut reader)?;
//! assert_eq!((point.x, point.y), (1, 2));
//! # Ok::<(), dualconv::ConvertError>(())
//! ```

use crate::{error::Result, field::Field, wire::WireTag};

/// Outcome of opening an array or map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayLength {
    /// The value was encoded as null.
    Null,
    /// Element count known up front (binary).
    Sized(usize),
    /// Elements run until a terminator (JSON).
    Unsized,
}

/// Encoder half of a format.
pub trait Writer {
    /// Whether the format carries class names and wire tags.
    fn needs_class_name(&self) -> bool;

    fn write_bool(&mut self, value: bool) -> Result<()>;
    fn write_byte(&mut self, value: i8) -> Result<()>;
    fn write_short(&mut self, value: i16) -> Result<()>;
    fn write_char(&mut self, value: char) -> Result<()>;
    fn write_int(&mut self, value: i32) -> Result<()>;
    fn write_long(&mut self, value: i64) -> Result<()>;
    fn write_float(&mut self, value: f32) -> Result<()>;
    fn write_double(&mut self, value: f64) -> Result<()>;

    /// Writes a general string; `None` is the null string.
    fn write_string(&mut self, value: Option<&str>) -> Result<()>;
    /// Writes an identifier-sized ASCII string.
    fn write_small_string(&mut self, value: &str) -> Result<()>;
    fn write_null(&mut self) -> Result<()>;

    fn write_array_begin(&mut self, len: usize) -> Result<()>;
    /// Separates two array elements, or two map entries.
    fn write_array_mark(&mut self) -> Result<()>;
    fn write_array_end(&mut self) -> Result<()>;

    fn write_map_begin(&mut self, len: usize) -> Result<()>;
    /// Separates a map key from its value.
    fn write_map_mark(&mut self) -> Result<()>;
    fn write_map_end(&mut self) -> Result<()>;

    fn write_object_begin(&mut self) -> Result<()>;
    /// Writes a whole object as null.
    fn write_object_null(&mut self) -> Result<()>;
    fn write_object_end(&mut self) -> Result<()>;
    fn write_field_name(&mut self, field: &Field) -> Result<()>;
}

/// Decoder half of a format.
///
/// Readers are single-pass: the field cursor and lookahead state make one
/// instance usable by one call sequence at a time.
pub trait Reader {
    /// Cursor over the logical stream; `-1` before the first unit.
    fn position(&self) -> i64;

    fn read_bool(&mut self) -> Result<bool>;
    fn read_byte(&mut self) -> Result<i8>;
    fn read_short(&mut self) -> Result<i16>;
    fn read_char(&mut self) -> Result<char>;
    fn read_int(&mut self) -> Result<i32>;
    fn read_long(&mut self) -> Result<i64>;
    fn read_float(&mut self) -> Result<f32>;
    fn read_double(&mut self) -> Result<f64>;

    /// Reads a general string; `None` is the null string.
    fn read_string(&mut self) -> Result<Option<String>>;
    fn read_small_string(&mut self) -> Result<Option<String>>;

    fn read_array_begin(&mut self) -> Result<ArrayLength>;
    fn read_array_end(&mut self) -> Result<()>;
    fn read_map_begin(&mut self) -> Result<ArrayLength>;
    fn read_map_end(&mut self) -> Result<()>;
    /// Consumes the separator between a key and its value.
    fn read_blank(&mut self) -> Result<()>;

    /// Opens an object. `None` means the object was written as null;
    /// otherwise the class name slot is returned (empty when unset).
    fn read_object_begin(&mut self) -> Result<Option<String>>;
    fn read_object_end(&mut self) -> Result<()>;
    /// Whether another field (or element) follows.
    fn has_next(&mut self) -> Result<bool>;

    /// Reads the next field name and looks it up in `fields`.
    ///
    /// `None` means the field is unknown; the caller must then call
    /// [`Reader::skip_value`].
    fn read_field_index(&mut self, fields: &[Field]) -> Result<Option<usize>>;

    fn read_field_name<'f>(&mut self, fields: &'f [Field]) -> Result<Option<&'f Field>> {
        Ok(self.read_field_index(fields)?.map(|i| &fields[i]))
    }

    /// Consumes exactly one value without decoding it.
    fn skip_value(&mut self) -> Result<()>;

    /// Whether element `index` of an array opened with `len` exists.
    fn next_element(&mut self, len: ArrayLength, index: usize) -> Result<bool> {
        match len {
            ArrayLength::Null => Ok(false),
            ArrayLength::Sized(n) => Ok(index < n),
            ArrayLength::Unsized => self.has_next(),
        }
    }
}

/// Implemented by collaborators for every type they can encode.
pub trait Encode {
    /// Tag written before a field of this type.
    const WIRE_TAG: WireTag;
    /// Tag of a field holding an array of this type.
    const ARRAY_TAG: WireTag = WireTag::Object;

    /// Encodes `self`.
    ///
    /// # Errors
    ///
    /// Propagates any error of the underlying writer.
    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()>;
}

/// Implemented by collaborators for every type they can decode.
pub trait Decode: Sized {
    /// Decodes one value.
    ///
    /// # Errors
    ///
    /// Propagates any error of the underlying reader.
    fn decode<R: Reader + ?Sized>(input: &mut R) -> Result<Self>;
}
