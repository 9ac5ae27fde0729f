use std::io::Cursor;

use bytes::BytesMut;
use insta::assert_snapshot;
use rstest::rstest;

use super::{
    chunk_helpers::{split_by, split_even},
    fixtures::{Inner, Record, Revised},
};
use crate::{
    BinaryConvert, BinaryReader, BinaryWriter, Decode, Encode, Field, Reader, WireTag, Writer,
    store::fixed_chunks,
};

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}

#[test]
fn inner_object_layout() {
    let inner = Inner {
        x: -2,
        label: "in".into(),
    };
    let bytes = BinaryConvert::new().convert_to(&inner).unwrap();
    assert_snapshot!(
        hex(&bytes),
        @"00 00 bb 01 01 78 03 ff fe 01 05 6c 61 62 65 6c 09 00 00 00 02 69 6e 00 00 ee"
    );
}

#[test]
fn record_round_trips_through_every_store() {
    let convert = BinaryConvert::new();
    let record = Record::sample();

    let bytes = convert.convert_to(&record).unwrap();
    assert_eq!(convert.convert_from::<Record>(bytes.clone()).unwrap(), record);

    let chunks = convert.convert_to_buffers(&record, fixed_chunks(7)).unwrap();
    assert!(chunks.len() > 1);
    assert_eq!(chunks.concat(), bytes);
    assert_eq!(convert.convert_from_buffers::<Record>(chunks).unwrap(), record);
    assert_eq!(
        convert
            .convert_from_buffers::<Record>(split_even(&bytes, 5))
            .unwrap(),
        record
    );

    let mut streamed = Vec::new();
    convert.convert_to_stream(&record, &mut streamed).unwrap();
    assert_eq!(streamed, bytes);
    assert_eq!(
        convert
            .convert_from_stream::<Record, _>(Cursor::new(streamed))
            .unwrap(),
        record
    );
}

#[test]
fn nulls_survive_the_round_trip() {
    let convert = BinaryConvert::new();
    let record = Record {
        name: None,
        inner: None,
        ..Record::sample()
    };
    let bytes = convert.convert_to(&record).unwrap();
    assert_eq!(convert.convert_from::<Record>(bytes).unwrap(), record);
}

#[test]
fn null_object_decodes_as_default() {
    let mut writer = BinaryWriter::new();
    writer.write_object_null().unwrap();
    let record = BinaryConvert::new()
        .convert_from::<Record>(writer.into_vec())
        .unwrap();
    assert_eq!(record, Record::default());
}

#[test]
fn small_string_at_its_limit() {
    let name = "n".repeat(255);
    let mut writer = BinaryWriter::new();
    writer.write_small_string(&name).unwrap();
    assert_eq!(writer.count(), 256);

    let mut reader = BinaryReader::new(writer.into_vec());
    assert_eq!(reader.read_small_string().unwrap(), Some(name));
    assert_eq!(reader.position(), 255);
}

#[rstest]
fn long_split_at_every_offset(#[values(1, 2, 3, 4, 5, 6, 7)] at: usize) {
    let value = -0x0102_0304_0506_0708_i64;
    let mut writer = BinaryWriter::new();
    writer.write_long(value).unwrap();
    writer.write_char('€').unwrap();
    let chunks = split_by(writer.as_bytes(), &[at - 1, 0, 0, 100]);

    let mut reader = BinaryReader::from_chunks(chunks);
    assert_eq!(reader.read_long().unwrap(), value);
    assert_eq!(reader.read_char().unwrap(), '€');
    assert_eq!(reader.position(), 9);
}

#[rstest]
fn long_written_across_chunk_boundary(#[values(1, 2, 3, 4, 5, 6, 7)] remaining: usize) {
    let value = -0x0102_0304_0506_0708_i64;
    let lead = 8 - remaining;
    let mut writer = BinaryWriter::with_chunks(fixed_chunks(8));
    for i in 0..lead {
        writer.write_byte(i8::try_from(i).unwrap()).unwrap();
    }
    writer.write_long(value).unwrap();
    let chunks = writer.into_buffers();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].len(), 8);
    assert_eq!(chunks.concat()[lead..], value.to_be_bytes());

    let mut reader = BinaryReader::from_chunks(chunks);
    for i in 0..lead {
        assert_eq!(reader.read_byte().unwrap(), i8::try_from(i).unwrap());
    }
    assert_eq!(reader.read_long().unwrap(), value);
}

#[test]
fn unknown_fields_are_skipped() {
    let revised = Revised {
        record: Record::sample(),
        legacy: Inner {
            x: 9,
            label: "old".into(),
        },
        blob: vec![1, 2, 3],
        notes: vec!["n1".into(), "n2".into()],
        memo: None,
        flag: true,
    };
    let convert = BinaryConvert::new();
    let bytes = convert.convert_to(&revised).unwrap();
    assert_eq!(convert.convert_from::<Record>(bytes).unwrap(), revised.record);
}

#[test]
fn fields_out_of_declaration_order() {
    static LABEL: Field = Field::new("label", WireTag::String);
    static X: Field = Field::new("x", WireTag::Short);

    let mut writer = BinaryWriter::new();
    writer.write_object_begin().unwrap();
    writer.write_field_name(&LABEL).unwrap();
    "swapped".encode(&mut writer).unwrap();
    writer.write_field_name(&X).unwrap();
    writer.write_short(12).unwrap();
    writer.write_object_end().unwrap();

    let mut reader = BinaryReader::new(writer.into_vec());
    let inner = Inner::decode(&mut reader).unwrap();
    assert_eq!(inner.x, 12);
    assert_eq!(inner.label, "swapped");
}

#[test]
fn class_slot_is_reported() {
    let mut writer = BinaryWriter::with_chunks(|| BytesMut::with_capacity(3));
    writer.write_typed_object_begin("Point").unwrap();
    writer.write_object_end().unwrap();

    let mut reader = BinaryReader::from_chunks(writer.into_buffers());
    assert_eq!(reader.read_object_begin().unwrap().as_deref(), Some("Point"));
    assert!(!reader.has_next().unwrap());
    reader.read_object_end().unwrap();
}

#[test]
fn facade_reuses_pooled_instances() {
    let convert = BinaryConvert::new();
    for id in 0..3 {
        let record = Record {
            id,
            ..Record::default()
        };
        let bytes = convert.convert_to(&record).unwrap();
        assert_eq!(convert.convert_from::<Record>(bytes).unwrap().id, id);
    }
    assert_eq!(convert.writers().idle(), 1);
    assert_eq!(convert.readers().idle(), 1);
}
