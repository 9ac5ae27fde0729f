//! UTF-8 decoding and JSON string escaping.
//!
//! The binary format stores strings as raw UTF-8 and the JSON reader decodes
//! characters one at a time out of whatever byte source backs it, so a
//! multi-byte sequence may straddle two chunks. Decoding therefore works in
//! two steps: [`sequence_len`] classifies the leading byte, the caller pulls
//! the continuation bytes from its source, and [`decode_scalar`] validates
//! and assembles the scalar value.
//!
//! The JSON escape helpers live here as well because they are byte-level
//! scans: every byte of a multi-byte sequence is `>= 0x80`, so none of them
//! can be mistaken for one of the escaped ASCII characters.

use crate::error::FormatError;

/// Length of the sequence introduced by `first`, or `None` if `first` is a
/// continuation byte or can never start a valid sequence.
#[inline]
#[must_use]
pub const fn sequence_len(first: u8) -> Option<usize> {
    match first {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// Decodes exactly one scalar from a complete sequence.
///
/// # Errors
///
/// Bad continuation bytes, overlong forms, surrogates and values above
/// U+10FFFF are all rejected with [`FormatError::InvalidUtf8`].
pub fn decode_scalar(bytes: &[u8]) -> Result<char, FormatError> {
    let invalid = || FormatError::InvalidUtf8(bytes.to_vec());
    let Some(&first) = bytes.first() else {
        return Err(invalid());
    };
    if sequence_len(first) != Some(bytes.len()) {
        return Err(invalid());
    }
    if bytes[1..].iter().any(|&b| b & 0xC0 != 0x80) {
        return Err(invalid());
    }
    let tail = |i: usize| u32::from(bytes[i] & 0x3F);
    let (code, min) = match bytes.len() {
        1 => (u32::from(first), 0),
        2 => ((u32::from(first & 0x1F) << 6) | tail(1), 0x80),
        3 => (
            (u32::from(first & 0x0F) << 12) | (tail(1) << 6) | tail(2),
            0x800,
        ),
        _ => (
            (u32::from(first & 0x07) << 18) | (tail(1) << 12) | (tail(2) << 6) | tail(3),
            0x1_0000,
        ),
    };
    if code < min {
        return Err(invalid());
    }
    char::from_u32(code).ok_or_else(invalid)
}

/// Decodes a whole buffer into a `String`.
///
/// ASCII input takes a fast path that maps every byte straight to a char.
///
/// # Errors
///
/// Returns [`FormatError::InvalidUtf8`] with the offending sequence.
pub fn decode(bytes: &[u8]) -> Result<String, FormatError> {
    if bytes.is_ascii() {
        return Ok(bytes.iter().map(|&b| char::from(b)).collect());
    }
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < 0x80 {
            out.push(char::from(b));
            i += 1;
            continue;
        }
        let width = sequence_len(b).ok_or_else(|| FormatError::InvalidUtf8(vec![b]))?;
        let end = (i + width).min(bytes.len());
        out.push(decode_scalar(&bytes[i..end])?);
        i = end;
    }
    Ok(out)
}

/// Second character of the short JSON escape for `b`, if it has one.
#[inline]
#[must_use]
pub const fn escape_for(b: u8) -> Option<u8> {
    match b {
        b'\n' => Some(b'n'),
        b'\r' => Some(b'r'),
        b'\t' => Some(b't'),
        b'\x08' => Some(b'b'),
        b'\x0C' => Some(b'f'),
        b'\\' => Some(b'\\'),
        b'"' => Some(b'"'),
        _ => None,
    }
}

/// Bytes the escaped form of `b` takes. Control characters without a short
/// escape become `\u00XX`.
#[inline]
const fn escaped_width(b: u8) -> usize {
    if escape_for(b).is_some() {
        2
    } else if b < 0x20 {
        6
    } else {
        1
    }
}

/// Whether `s` contains any character the JSON writer escapes.
#[must_use]
pub fn needs_escape(s: &str) -> bool {
    s.bytes().any(|b| escaped_width(b) > 1)
}

/// Encoded length of `s` once escaped (quotes not included).
#[must_use]
pub fn escaped_len(s: &str) -> usize {
    s.bytes().map(escaped_width).sum()
}

/// Appends the escaped form of `s` to `out`.
pub fn escape_into(s: &str, out: &mut Vec<u8>) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    out.reserve(escaped_len(s));
    for b in s.bytes() {
        match escape_for(b) {
            Some(e) => out.extend_from_slice(&[b'\\', e]),
            None if b < 0x20 => out.extend_from_slice(&[
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX[usize::from(b >> 4)],
                HEX[usize::from(b & 0xF)],
            ]),
            None => out.push(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::QuickCheck;

    use super::*;

    #[test]
    fn decode_round_trips_quickcheck() {
        fn prop(s: String) -> bool {
            decode(s.as_bytes()).as_deref() == Ok(s.as_str())
        }
        QuickCheck::new().quickcheck(prop as fn(String) -> bool);
    }

    #[test]
    fn rejects_overlong_and_surrogates() {
        assert!(decode_scalar(&[0xC0, 0x80]).is_err());
        assert!(decode_scalar(&[0xE0, 0x80, 0x80]).is_err());
        assert!(decode_scalar(&[0xED, 0xA0, 0x80]).is_err());
        assert!(decode_scalar(&[0xF4, 0x90, 0x80, 0x80]).is_err());
        assert_eq!(decode_scalar(&[0xE2, 0x82, 0xAC]), Ok('€'));
    }

    #[test]
    fn truncated_tail_is_invalid() {
        assert_eq!(
            decode(&[b'a', 0xE2, 0x82]),
            Err(FormatError::InvalidUtf8(vec![0xE2, 0x82]))
        );
        assert_eq!(decode(&[0x80]), Err(FormatError::InvalidUtf8(vec![0x80])));
    }

    #[test]
    fn escaping() {
        let s = "a\n\"b\\\tc\r";
        assert!(needs_escape(s));
        assert!(!needs_escape("plain é"));
        let mut out = Vec::new();
        escape_into(s, &mut out);
        assert_eq!(out, br#"a\n\"b\\\tc\r"#);
        assert_eq!(escaped_len(s), out.len());
    }

    #[test]
    fn control_characters_use_unicode_escapes() {
        let s = "a\u{1}b\u{8}\u{1f}\u{7f}";
        assert!(needs_escape("\u{0}"));
        let mut out = Vec::new();
        escape_into(s, &mut out);
        assert_eq!(out, b"a\\u0001b\\b\\u001f\x7f");
        assert_eq!(escaped_len(s), out.len());
    }
}
