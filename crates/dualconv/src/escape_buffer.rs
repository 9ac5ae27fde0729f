//! Decoding of `\uXXXX` escapes inside JSON strings.
//!
//! The [`UnicodeEscapeBuffer`] accumulates the four hexadecimal digits of a
//! single escape and yields the UTF-16 code unit they spell. JSON encodes
//! characters outside the basic multilingual plane as two consecutive
//! escapes (a surrogate pair), so the buffer also remembers a pending high
//! surrogate until the next unit arrives.
//!
//! A high surrogate that is not followed by a low one, and a low surrogate
//! with no preceding high one, both decode to U+FFFD.

use crate::error::FormatError;

const REPLACEMENT: char = '\u{FFFD}';

#[derive(Debug, Default)]
pub(crate) struct UnicodeEscapeBuffer {
    unit: u16,
    len: u8,
    high: Option<u16>,
}

impl UnicodeEscapeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops any digits and pending surrogate.
    pub fn reset(&mut self) {
        self.unit = 0;
        self.len = 0;
        self.high = None;
    }

    /// Feeds one hexadecimal digit.
    ///
    /// - Returns `Ok(None)` while fewer than four digits have been seen.
    /// - Returns `Ok(Some(unit))` on the fourth digit and starts over.
    /// - Returns `Err` if `c` is not an ASCII hex digit.
    #[allow(clippy::cast_possible_truncation)]
    pub fn feed(&mut self, c: char) -> Result<Option<u16>, FormatError> {
        let digit = c
            .to_digit(16)
            .ok_or(FormatError::InvalidUnicodeEscapeChar(c))?;
        self.unit = (self.unit << 4) | digit as u16;
        self.len += 1;
        if self.len < 4 {
            return Ok(None);
        }
        let unit = self.unit;
        self.unit = 0;
        self.len = 0;
        Ok(Some(unit))
    }

    /// Appends the character for `unit` to `out`, joining surrogate pairs.
    pub fn push_unit(&mut self, unit: u16, out: &mut String) {
        match (self.high.take(), unit) {
            (None, 0xD800..=0xDBFF) => self.high = Some(unit),
            (Some(high), 0xDC00..=0xDFFF) => {
                let code = 0x1_0000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00);
                out.push(char::from_u32(code).unwrap_or(REPLACEMENT));
            }
            (Some(_), 0xD800..=0xDBFF) => {
                out.push(REPLACEMENT);
                self.high = Some(unit);
            }
            (pending, _) => {
                if pending.is_some() {
                    out.push(REPLACEMENT);
                }
                out.push(char::from_u32(u32::from(unit)).unwrap_or(REPLACEMENT));
            }
        }
    }

    /// Resolves a dangling high surrogate before any non-escape content.
    pub fn flush(&mut self, out: &mut String) {
        if self.high.take().is_some() {
            out.push(REPLACEMENT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::UnicodeEscapeBuffer;
    use crate::error::FormatError;

    fn decode(units: &str) -> String {
        let mut buf = UnicodeEscapeBuffer::new();
        let mut out = String::new();
        for ch in units.chars() {
            if let Some(unit) = buf.feed(ch).unwrap() {
                buf.push_unit(unit, &mut out);
            }
        }
        buf.flush(&mut out);
        out
    }

    #[test]
    fn basic_decoding() {
        let mut buf = UnicodeEscapeBuffer::new();
        assert_eq!(buf.feed('0').unwrap(), None);
        assert_eq!(buf.feed('0').unwrap(), None);
        assert_eq!(buf.feed('4').unwrap(), None);
        assert_eq!(buf.feed('1').unwrap(), Some(0x41));
    }

    #[test]
    fn mixed_case_hex() {
        assert_eq!(decode("AbCd"), "\u{ABCD}");
    }

    #[test]
    fn reset_clears_buffer() {
        let mut buf = UnicodeEscapeBuffer::new();
        assert!(buf.feed('F').unwrap().is_none());
        buf.reset();
        for ch in "004".chars() {
            assert_eq!(buf.feed(ch).unwrap(), None);
        }
        assert_eq!(buf.feed('2').unwrap(), Some(0x42));
    }

    #[test]
    fn invalid_hex_error() {
        let mut buf = UnicodeEscapeBuffer::new();
        assert_eq!(
            buf.feed('G'),
            Err(FormatError::InvalidUnicodeEscapeChar('G'))
        );
    }

    #[test]
    fn surrogate_pair_joins() {
        assert_eq!(decode("D83DDE00"), "😀");
    }

    #[test]
    fn lone_surrogates_are_replaced() {
        assert_eq!(decode("D800"), "\u{FFFD}");
        assert_eq!(decode("DC00"), "\u{FFFD}");
        assert_eq!(decode("D8000041"), "\u{FFFD}A");
        assert_eq!(decode("D800D83DDE00"), "\u{FFFD}😀");
    }
}
