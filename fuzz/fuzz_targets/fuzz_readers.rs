#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use dualconv::{BinaryConvert, Decode, JsonConvert, Result};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    json: bool,
    data: Vec<u8>,
    splits: Vec<u8>,
}

fn chunks(data: &[u8], splits: &[u8]) -> Vec<Bytes> {
    let data = Bytes::copy_from_slice(data);
    let mut out = Vec::new();
    let mut start = 0;
    for &s in splits {
        if start >= data.len() {
            break;
        }
        let end = (start + 1 + usize::from(s)).min(data.len());
        out.push(data.slice(start..end));
        start = end;
    }
    if start < data.len() {
        out.push(data.slice(start..));
    }
    out
}

/// Whole-buffer and chunked decoding must agree on the value, and on
/// whether and where the input is rejected.
fn same<T: Decode + PartialEq + std::fmt::Debug>(whole: Result<T>, chunked: Result<T>) {
    match (whole, chunked) {
        (Ok(a), Ok(b)) => assert_eq!(a, b),
        (Err(a), Err(b)) => {
            assert_eq!(a.format_error(), b.format_error());
            assert_eq!(a.position(), b.position());
        }
        (a, b) => panic!("array and chunk readers disagree: {a:?} vs {b:?}"),
    }
}

fuzz_target!(|input: Input| {
    let parts = chunks(&input.data, &input.splits);
    if input.json {
        let convert = JsonConvert::new();
        same(
            convert.convert_from::<Vec<String>>(input.data.clone()),
            convert.convert_from_buffers::<Vec<String>>(parts.clone()),
        );
        same(
            convert.convert_from::<Vec<i64>>(input.data),
            convert.convert_from_buffers::<Vec<i64>>(parts),
        );
    } else {
        let convert = BinaryConvert::new();
        same(
            convert.convert_from::<Vec<String>>(input.data.clone()),
            convert.convert_from_buffers::<Vec<String>>(parts.clone()),
        );
        same(
            convert.convert_from::<Vec<i64>>(input.data),
            convert.convert_from_buffers::<Vec<i64>>(parts),
        );
    }
});
