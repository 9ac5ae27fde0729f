use std::io;

use thiserror::Error;

/// A failure raised by a reader or writer, tagged with the cursor position
/// at which it happened.
///
/// Every failure of a decode or encode pass is fatal for that pass; there
/// is no recovery or retry inside the codecs.
#[derive(Error, Debug)]
#[error("{source} (position = {position})")]
pub struct ConvertError {
    pub(crate) source: ErrorSource,
    pub(crate) position: i64,
}

impl ConvertError {
    pub(crate) fn new(source: impl Into<ErrorSource>, position: i64) -> Self {
        Self {
            source: source.into(),
            position,
        }
    }

    /// Cursor position when the error was raised. `-1` means nothing had
    /// been consumed or produced yet.
    #[must_use]
    pub fn position(&self) -> i64 {
        self.position
    }

    /// The underlying cause.
    #[must_use]
    pub fn kind(&self) -> &ErrorSource {
        &self.source
    }

    /// The format error, if this is not an I/O failure.
    #[must_use]
    pub fn format_error(&self) -> Option<&FormatError> {
        match &self.source {
            ErrorSource::Format(e) => Some(e),
            ErrorSource::Io(_) => None,
        }
    }

    /// Whether the backing stream failed.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self.source, ErrorSource::Io(_))
    }
}

/// The two error families of the codecs.
#[derive(Error, Debug)]
pub enum ErrorSource {
    #[error("format error: {0}")]
    Format(#[from] FormatError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Malformed input or an unencodable value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("expected sentinel {expected:#06x} but found {found:#06x}")]
    SentinelMismatch { expected: i16, found: i16 },
    #[error("illegal has-next flag {0}")]
    IllegalHasNext(u8),
    #[error("expected {expected} but found '{found}'")]
    Unexpected { expected: &'static str, found: char },
    #[error("illegal character '{0}'")]
    IllegalChar(char),
    #[error("illegal escape '\\{0}'")]
    IllegalEscape(char),
    #[error("invalid unicode escape sequence at character '{0}'")]
    InvalidUnicodeEscapeChar(char),
    #[error("unterminated string")]
    UnterminatedString,
    #[error("expected a value but found '{0}'")]
    EmptyToken(char),
    #[error("small string of {0} bytes exceeds 255")]
    SmallStringTooLong(usize),
    #[error("small string contains non-ascii character '{0}'")]
    NonAsciiSmallString(char),
    #[error("char {0:?} does not fit in 16 bits")]
    WideChar(char),
    #[error("invalid char code {0:#06x}")]
    InvalidChar(u32),
    #[error("invalid utf-8 sequence {:?}", bstr::BStr::new(.0))]
    InvalidUtf8(Vec<u8>),
    #[error("negative length {0}")]
    NegativeLength(i32),
    #[error("length {0} does not fit a 32-bit prefix")]
    LengthOverflow(usize),
    #[error("unknown wire tag {0}")]
    UnknownTag(u8),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("invalid literal '{0}'")]
    InvalidLiteral(String),
    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),
    #[error("unexpected end of input")]
    UnexpectedEnd,
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position() {
        let err = ConvertError::new(
            FormatError::SentinelMismatch {
                expected: 0xBB,
                found: 0x12,
            },
            7,
        );
        assert_eq!(
            err.to_string(),
            "format error: expected sentinel 0x00bb but found 0x0012 (position = 7)"
        );
        assert_eq!(err.position(), 7);
        assert!(!err.is_io());
    }

    #[test]
    fn io_errors_share_the_family() {
        let err = ConvertError::new(io::Error::other("disk gone"), -1);
        assert!(err.is_io());
        assert!(err.format_error().is_none());
        assert_eq!(err.to_string(), "i/o error: disk gone (position = -1)");
    }

    #[test]
    fn invalid_utf8_renders_bytes() {
        let err = FormatError::InvalidUtf8(vec![b'a', 0xFF]);
        let text = err.to_string();
        assert!(text.starts_with(r#"invalid utf-8 sequence "a\x"#), "{text}");
    }
}
