//! Integer text conversion without going through `fmt`.
//!
//! Formatting peels two digits per division by 100 and looks both up in the
//! tens/ones tables, then finishes one digit at a time once the remainder is
//! small. Parsing classifies each character through [`DIGIT_CLASS`].

/// Longest `i64` rendering: 19 digits plus the sign.
pub(crate) const I64_TEXT_LEN: usize = 20;

/// Tens digit of every value in `0..100`.
static DIGIT_TENS: [u8; 100] = *b"\
    0000000000\
    1111111111\
    2222222222\
    3333333333\
    4444444444\
    5555555555\
    6666666666\
    7777777777\
    8888888888\
    9999999999";

/// Ones digit of every value in `0..100`.
static DIGIT_ONES: [u8; 100] = *b"\
    0123456789\
    0123456789\
    0123456789\
    0123456789\
    0123456789\
    0123456789\
    0123456789\
    0123456789\
    0123456789\
    0123456789";

/// Writes the decimal form of `value` into the tail of `buf` and returns
/// that tail.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn format_i64(value: i64, buf: &mut [u8; I64_TEXT_LEN]) -> &[u8] {
    let mut q = value.unsigned_abs();
    let mut pos = buf.len();
    while q >= 65_536 {
        let r = (q % 100) as usize;
        q /= 100;
        pos -= 1;
        buf[pos] = DIGIT_ONES[r];
        pos -= 1;
        buf[pos] = DIGIT_TENS[r];
    }
    loop {
        let r = (q % 10) as u8;
        q /= 10;
        pos -= 1;
        buf[pos] = b'0' + r;
        if q == 0 {
            break;
        }
    }
    if value < 0 {
        pos -= 1;
        buf[pos] = b'-';
    }
    &buf[pos..]
}

pub(crate) fn format_i32(value: i32, buf: &mut [u8; I64_TEXT_LEN]) -> &[u8] {
    format_i64(i64::from(value), buf)
}

/// How the integer scanner treats a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DigitClass {
    Digit,
    /// Quotes around a number are skipped.
    Quote,
    /// Ends the number; left for the next read.
    Stop,
    Illegal,
}

pub(crate) static DIGIT_CLASS: [DigitClass; 128] = build_class_table();

const fn build_class_table() -> [DigitClass; 128] {
    let mut table = [DigitClass::Illegal; 128];
    let mut i = 0;
    while i <= b' ' as usize {
        table[i] = DigitClass::Stop;
        i += 1;
    }
    let mut d = b'0';
    while d <= b'9' {
        table[d as usize] = DigitClass::Digit;
        d += 1;
    }
    table[b',' as usize] = DigitClass::Stop;
    table[b'}' as usize] = DigitClass::Stop;
    table[b']' as usize] = DigitClass::Stop;
    table[b':' as usize] = DigitClass::Stop;
    table[b'"' as usize] = DigitClass::Quote;
    table[b'\'' as usize] = DigitClass::Quote;
    table
}

#[inline]
pub(crate) fn classify(c: char) -> DigitClass {
    DIGIT_CLASS
        .get(c as usize)
        .copied()
        .unwrap_or(DigitClass::Illegal)
}

/// `value * 10 + digit`, wrapping on overflow.
#[inline]
pub(crate) fn push_digit(value: i64, digit: u32) -> i64 {
    (value << 3)
        .wrapping_add(value << 1)
        .wrapping_add(i64::from(digit))
}

#[cfg(test)]
mod tests {
    use quickcheck::QuickCheck;
    use rstest::rstest;

    use super::*;

    fn render(value: i64) -> String {
        let mut buf = [0u8; I64_TEXT_LEN];
        String::from_utf8(format_i64(value, &mut buf).to_vec()).unwrap()
    }

    #[rstest]
    #[case(0)]
    #[case(7)]
    #[case(-7)]
    #[case(65_535)]
    #[case(65_536)]
    #[case(100)]
    #[case(-1_000_000)]
    #[case(i64::MAX)]
    #[case(i64::MIN)]
    fn matches_std(#[case] value: i64) {
        assert_eq!(render(value), value.to_string());
    }

    #[test]
    fn int_extremes() {
        let mut buf = [0u8; I64_TEXT_LEN];
        assert_eq!(format_i32(i32::MIN, &mut buf), b"-2147483648");
        assert_eq!(format_i32(i32::MAX, &mut buf), b"2147483647");
    }

    #[test]
    fn formatting_quickcheck() {
        fn prop(value: i64) -> bool {
            render(value) == value.to_string()
        }
        QuickCheck::new().quickcheck(prop as fn(i64) -> bool);
    }

    #[test]
    fn classification() {
        assert_eq!(classify('5'), DigitClass::Digit);
        assert_eq!(classify('\''), DigitClass::Quote);
        assert_eq!(classify(' '), DigitClass::Stop);
        assert_eq!(classify('}'), DigitClass::Stop);
        assert_eq!(classify('x'), DigitClass::Illegal);
        assert_eq!(classify('é'), DigitClass::Illegal);
    }

    #[test]
    fn shift_accumulation() {
        let mut v = 0;
        for d in [1, 2, 3, 4] {
            v = push_digit(v, d);
        }
        assert_eq!(v, 1234);
    }
}
