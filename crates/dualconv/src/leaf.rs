//! `Encode`/`Decode` for the primitive leaves, strings and arrays.

use crate::{
    codec::{ArrayLength, Decode, Encode, Reader, Writer},
    error::Result,
    wire::WireTag,
};

macro_rules! primitive {
    ($ty:ty, $tag:ident, $array:ident, $write:ident, $read:ident) => {
        impl Encode for $ty {
            const WIRE_TAG: WireTag = WireTag::$tag;
            const ARRAY_TAG: WireTag = WireTag::$array;

            fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
                out.$write(*self)
            }
        }

        impl Decode for $ty {
            fn decode<R: Reader + ?Sized>(input: &mut R) -> Result<Self> {
                input.$read()
            }
        }
    };
}

primitive!(bool, Bool, BoolArray, write_bool, read_bool);
primitive!(i8, Byte, ByteArray, write_byte, read_byte);
primitive!(i16, Short, ShortArray, write_short, read_short);
primitive!(char, Char, CharArray, write_char, read_char);
primitive!(i32, Int, IntArray, write_int, read_int);
primitive!(i64, Long, LongArray, write_long, read_long);
primitive!(f32, Float, FloatArray, write_float, read_float);
primitive!(f64, Double, DoubleArray, write_double, read_double);

impl Encode for str {
    const WIRE_TAG: WireTag = WireTag::String;
    const ARRAY_TAG: WireTag = WireTag::StringArray;

    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        out.write_string(Some(self))
    }
}

impl Encode for String {
    const WIRE_TAG: WireTag = WireTag::String;
    const ARRAY_TAG: WireTag = WireTag::StringArray;

    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        out.write_string(Some(self))
    }
}

/// A null string decodes to the empty string.
impl Decode for String {
    fn decode<R: Reader + ?Sized>(input: &mut R) -> Result<Self> {
        Ok(input.read_string()?.unwrap_or_default())
    }
}

impl Encode for Option<String> {
    const WIRE_TAG: WireTag = WireTag::String;
    const ARRAY_TAG: WireTag = WireTag::StringArray;

    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        out.write_string(self.as_deref())
    }
}

impl Decode for Option<String> {
    fn decode<R: Reader + ?Sized>(input: &mut R) -> Result<Self> {
        input.read_string()
    }
}

impl<T: Encode> Encode for [T] {
    const WIRE_TAG: WireTag = T::ARRAY_TAG;

    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        out.write_array_begin(self.len())?;
        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                out.write_array_mark()?;
            }
            item.encode(out)?;
        }
        out.write_array_end()
    }
}

impl<T: Encode> Encode for Vec<T> {
    const WIRE_TAG: WireTag = T::ARRAY_TAG;

    fn encode<W: Writer + ?Sized>(&self, out: &mut W) -> Result<()> {
        self.as_slice().encode(out)
    }
}

/// A null array decodes to an empty vector.
impl<T: Decode> Decode for Vec<T> {
    fn decode<R: Reader + ?Sized>(input: &mut R) -> Result<Self> {
        let len = input.read_array_begin()?;
        let mut items = match len {
            ArrayLength::Sized(n) => Vec::with_capacity(n.min(4096)),
            _ => Vec::new(),
        };
        while input.next_element(len, items.len())? {
            items.push(T::decode(input)?);
        }
        input.read_array_end()?;
        Ok(items)
    }
}
