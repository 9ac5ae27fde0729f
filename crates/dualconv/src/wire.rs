//! Constants of the binary wire format.

use crate::error::FormatError;

/// Written in place of an object's begin sentinel, or of an array's count,
/// when the value is null.
pub const SIGN_NULL: i16 = -1;
/// Length prefix of a null general string.
pub const STRING_NULL: i32 = -1;
pub const SIGN_OBJECT_BEGIN: i16 = 0xBB;
pub const SIGN_OBJECT_END: i16 = 0xEE;
pub const SIGN_HAS_NEXT: u8 = 1;
pub const SIGN_NO_NEXT: u8 = 0;
/// Longest encoded small string.
pub const SMALL_STRING_MAX: usize = 255;

/// One-byte discriminator written before each field value.
///
/// The tag is enough to skip the value without knowing the type that
/// declared the field. Anything that is not a primitive, a string or an
/// array of those is tagged [`WireTag::Object`] and skipped as a nested
/// object.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WireTag {
    Bool = 1,
    Byte = 2,
    Short = 3,
    Char = 4,
    Int = 5,
    Long = 6,
    Float = 7,
    Double = 8,
    String = 9,
    BoolArray = 101,
    ByteArray = 102,
    ShortArray = 103,
    CharArray = 104,
    IntArray = 105,
    LongArray = 106,
    FloatArray = 107,
    DoubleArray = 108,
    StringArray = 109,
    Object = 127,
}

impl WireTag {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_u8(b: u8) -> Option<Self> {
        Some(match b {
            1 => Self::Bool,
            2 => Self::Byte,
            3 => Self::Short,
            4 => Self::Char,
            5 => Self::Int,
            6 => Self::Long,
            7 => Self::Float,
            8 => Self::Double,
            9 => Self::String,
            101 => Self::BoolArray,
            102 => Self::ByteArray,
            103 => Self::ShortArray,
            104 => Self::CharArray,
            105 => Self::IntArray,
            106 => Self::LongArray,
            107 => Self::FloatArray,
            108 => Self::DoubleArray,
            109 => Self::StringArray,
            127 => Self::Object,
            _ => return None,
        })
    }

    /// Encoded width of a fixed-size scalar.
    #[must_use]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Bool | Self::Byte => Some(1),
            Self::Short | Self::Char => Some(2),
            Self::Int | Self::Float => Some(4),
            Self::Long | Self::Double => Some(8),
            _ => None,
        }
    }

    /// Element tag of an array tag.
    #[must_use]
    pub const fn element(self) -> Option<Self> {
        match self {
            Self::BoolArray => Some(Self::Bool),
            Self::ByteArray => Some(Self::Byte),
            Self::ShortArray => Some(Self::Short),
            Self::CharArray => Some(Self::Char),
            Self::IntArray => Some(Self::Int),
            Self::LongArray => Some(Self::Long),
            Self::FloatArray => Some(Self::Float),
            Self::DoubleArray => Some(Self::Double),
            Self::StringArray => Some(Self::String),
            _ => None,
        }
    }
}

impl TryFrom<u8> for WireTag {
    type Error = FormatError;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        Self::from_u8(b).ok_or(FormatError::UnknownTag(b))
    }
}
