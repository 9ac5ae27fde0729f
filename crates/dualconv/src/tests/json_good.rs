use insta::assert_snapshot;
use rstest::rstest;
use serde_json::json;

use super::{
    chunk_helpers::split_by,
    fixtures::{Inner, Record, Revised},
};
use crate::{JsonConvert, JsonReader, JsonWriter, Reader, Writer, store::fixed_chunks};

#[test]
fn inner_object_text() {
    let inner = Inner {
        x: -2,
        label: "in".into(),
    };
    assert_snapshot!(JsonConvert::new().convert_to(&inner).unwrap(), @r#"{"x":-2,"label":"in"}"#);
}

#[rstest]
#[case(r#"{"x":5,"label":"hi"}"#)]
#[case("{x:5,label:hi}")]
#[case("{'x':'5', \"label\":'hi'}")]
#[case("{ , x : \"5\" , 'label' : 'hi' }")]
#[case("\n{\t\"label\": \"hi\",\r\n \"x\": 5\n}\n")]
fn lenient_forms_agree(#[case] text: &'static str) {
    let inner: Inner = JsonConvert::new().convert_from(text).unwrap();
    assert_eq!(inner.x, 5, "{text}");
    assert_eq!(inner.label, "hi", "{text}");
}

#[test]
fn record_round_trips() {
    let convert = JsonConvert::new();
    let record = Record::sample();
    let text = convert.convert_to(&record).unwrap();
    assert_eq!(convert.convert_from::<Record>(text.clone()).unwrap(), record);

    let mut streamed = Vec::new();
    convert.convert_to_stream(&record, &mut streamed).unwrap();
    assert_eq!(streamed, text.as_bytes());
    assert_eq!(
        convert
            .convert_from_stream::<Record, _>(streamed.as_slice())
            .unwrap(),
        record
    );
}

#[test]
fn output_is_strict_json() {
    let text = JsonConvert::new().convert_to(&Record::sample()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        parsed,
        json!({
            "id": 7,
            "name": "line\nbreak \"quoted\" back\\slash",
            "score": -12.5,
            "grade": 233,
            "active": true,
            "level": -3,
            "rank": 300,
            "ratio": 0.75,
            "tags": ["a", "", "ü€"],
            "samples": [i64::MIN, -1, 0, i64::MAX],
            "inner": {"x": -2, "label": "in"},
        })
    );

    let empty = JsonConvert::new()
        .convert_to(&Record {
            name: None,
            inner: None,
            ..Record::default()
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&empty).unwrap();
    assert_eq!(parsed["name"], serde_json::Value::Null);
    assert_eq!(parsed["inner"], serde_json::Value::Null);
    assert_eq!(parsed["tags"], json!([]));
}

#[test]
fn unknown_fields_are_skipped() {
    let revised = Revised {
        record: Record::sample(),
        legacy: Inner {
            x: 1,
            label: "}]'\"".into(),
        },
        blob: vec![-1, 0, 1],
        notes: vec!["[".into()],
        memo: Some("{".into()),
        flag: false,
    };
    let convert = JsonConvert::new();
    let text = convert.convert_to(&revised).unwrap();
    assert_eq!(convert.convert_from::<Record>(text).unwrap(), revised.record);
}

#[test]
fn every_split_of_the_text_decodes_alike() {
    let convert = JsonConvert::new();
    let record = Record::sample();
    let text = convert.convert_to(&record).unwrap();
    for at in 0..text.len() {
        let chunks = split_by(text.as_bytes(), &[at, usize::MAX]);
        let decoded: Record = convert.convert_from_buffers(chunks).unwrap();
        assert_eq!(decoded, record, "split after {} bytes", at + 1);
    }
}

#[test]
fn chunked_writer_matches_in_memory_writer() {
    let record = Record::sample();
    let chunks = JsonConvert::new()
        .convert_to_buffers(&record, fixed_chunks(5))
        .unwrap();
    assert_eq!(
        chunks.concat(),
        JsonConvert::new().convert_to(&record).unwrap().as_bytes()
    );
}

#[test]
fn seek_then_decode() {
    let text = JsonConvert::new().convert_to(&Record::sample()).unwrap();
    let mut reader = JsonReader::new(text);
    assert!(reader.seek("inner.label").unwrap());
    assert_eq!(reader.read_string().unwrap().as_deref(), Some("in"));
}

#[test]
fn maps_round_trip_by_hand() {
    let mut writer = JsonWriter::new();
    writer.write_map_begin(2).unwrap();
    for (i, (key, value)) in [("one", 1), ("two", 2)].into_iter().enumerate() {
        if i > 0 {
            writer.write_array_mark().unwrap();
        }
        writer.write_small_string(key).unwrap();
        writer.write_map_mark().unwrap();
        writer.write_int(value).unwrap();
    }
    writer.write_map_end().unwrap();
    assert_eq!(writer.to_string(), r#"{"one":1,"two":2}"#);

    let mut reader = JsonReader::new(writer.into_string());
    let len = reader.read_map_begin().unwrap();
    let mut entries = Vec::new();
    while reader.next_element(len, entries.len()).unwrap() {
        let key = reader.read_small_string().unwrap().unwrap_or_default();
        reader.read_blank().unwrap();
        entries.push((key, reader.read_int().unwrap()));
    }
    reader.read_map_end().unwrap();
    assert_eq!(entries, [("one".to_string(), 1), ("two".to_string(), 2)]);
}
