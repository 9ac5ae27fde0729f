use std::io::{self, Read, Write};

use super::fixtures::Record;
use crate::{BinaryConvert, BinaryReader, BinaryWriter, FormatError, Reader, Writer};

/// Accepts `budget` bytes, then fails every write.
struct Broken {
    budget: usize,
}

impl Write for Broken {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.budget == 0 {
            return Err(io::Error::other("disk full"));
        }
        let n = buf.len().min(self.budget);
        self.budget -= n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Dropout;

impl Read for Dropout {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"))
    }
}

#[test]
fn failing_stream_surfaces_as_io() {
    let err = BinaryConvert::new()
        .convert_to_stream(&Record::sample(), Broken { budget: 10 })
        .unwrap_err();
    assert!(err.is_io());
    assert_eq!(err.format_error(), None);
}

#[test]
fn failing_source_surfaces_as_io() {
    let err = BinaryConvert::new()
        .convert_from_stream::<Record, _>(Dropout)
        .unwrap_err();
    assert!(err.is_io());
    assert_eq!(err.position(), -1);
}

#[test]
fn truncated_record() {
    let convert = BinaryConvert::new();
    let bytes = convert.convert_to(&Record::sample()).unwrap();
    for cut in [0, 1, 3, 10, bytes.len() / 2, bytes.len() - 1] {
        let err = convert
            .convert_from::<Record>(bytes[..cut].to_vec())
            .unwrap_err();
        assert_eq!(
            err.format_error(),
            Some(&FormatError::UnexpectedEnd),
            "cut at {cut}"
        );
    }
}

#[test]
fn corrupted_end_sentinel() {
    let convert = BinaryConvert::new();
    let mut bytes = convert.convert_to(&Record::default()).unwrap();
    let last = bytes.len() - 1;
    bytes[last] = 0xEF;
    let err = convert.convert_from::<Record>(bytes).unwrap_err();
    assert_eq!(
        err.format_error(),
        Some(&FormatError::SentinelMismatch {
            expected: 0xEE,
            found: 0xEF,
        })
    );
    assert_eq!(err.position(), i64::try_from(last).unwrap());
}

#[test]
fn oversized_small_string_is_rejected() {
    let mut writer = BinaryWriter::new();
    let err = writer.write_small_string(&"x".repeat(256)).unwrap_err();
    assert_eq!(err.format_error(), Some(&FormatError::SmallStringTooLong(256)));
    assert_eq!(writer.count(), 0);
}

#[test]
fn skip_without_a_field_tag() {
    let err = BinaryReader::new(vec![0u8; 4]).skip_value().unwrap_err();
    assert_eq!(err.format_error(), Some(&FormatError::UnknownTag(0)));
}
