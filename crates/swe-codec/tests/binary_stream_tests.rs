//! Binary stream decoding and encoding against hand-built wire bytes.

use bytes::Bytes;
use chrono::{TimeZone, Utc};
use swe_codec::{decode_all, encode_to_bytes, CodecConfig, CodecError, DataStreamParser, ParserState};
use swe_common::{BinaryEncoding, ByteEncoding, ByteOrder, DataEncoding, Value};
use test_utils::{assert_block_values, count_values_record_le, fixtures, WireBuilder};

fn le_encoding() -> DataEncoding {
    DataEncoding::Binary(fixtures::count_and_values_le())
}

fn be_encoding() -> DataEncoding {
    DataEncoding::Binary(BinaryEncoding::new(ByteOrder::BigEndian))
}

fn parser(bytes: Vec<u8>, encoding: DataEncoding, config: CodecConfig) -> DataStreamParser<std::io::Cursor<Vec<u8>>> {
    DataStreamParser::new(
        fixtures::count_and_values(),
        &encoding,
        std::io::Cursor::new(bytes),
        config,
    )
    .unwrap()
}

// ============================================================================
// Sized arrays
// ============================================================================

#[test]
fn test_count_then_values_little_endian() {
    let bytes = count_values_record_le(&[1.0, 2.0, 3.5]);
    assert_eq!(bytes.len(), 28);

    let mut parser = parser(bytes, le_encoding(), CodecConfig::default());
    let block = parser.parse_next_block().unwrap().unwrap();
    assert_eq!(block.atom_count(), 4);
    assert_block_values!(
        block,
        [Value::Int(3), Value::Double(1.0), Value::Double(2.0), Value::Double(3.5)]
    );

    assert!(parser.parse_next_block().unwrap().is_none());
    assert_eq!(parser.state(), ParserState::Finished);
    assert_eq!(parser.records_parsed(), 1);
}

#[test]
fn test_records_of_different_sizes() {
    let mut bytes = count_values_record_le(&[1.0]);
    bytes.extend(count_values_record_le(&[2.0, 3.0]));
    bytes.extend(count_values_record_le(&[]));

    let blocks = decode_all(
        &fixtures::count_and_values(),
        &le_encoding(),
        Bytes::from(bytes),
        CodecConfig::default(),
    )
    .unwrap();

    let sizes: Vec<usize> = blocks.iter().map(|b| b.atom_count()).collect();
    assert_eq!(sizes, vec![2, 3, 1]);
    // each record got its own storage
    assert_eq!(blocks[0].value(1), Value::Double(1.0));
    assert_eq!(blocks[1].value(2), Value::Double(3.0));
}

#[test]
fn test_reused_block_aliases_previous_records() {
    let mut bytes = count_values_record_le(&[1.0, 2.0]);
    bytes.extend(count_values_record_le(&[5.0, 6.0]));

    let mut parser = parser(
        bytes,
        le_encoding(),
        CodecConfig::default().with_renew_data_block(false),
    );
    let first = parser.parse_next_block().unwrap().unwrap();
    assert_eq!(first.value(1), Value::Double(1.0));

    let second = parser.parse_next_block().unwrap().unwrap();
    assert!(second.as_mixed().unwrap().block(0).shares_storage(first.as_mixed().unwrap().block(0)));
    assert_eq!(first.value(1), Value::Double(5.0));
    assert_eq!(second.value(2), Value::Double(6.0));
}

#[test]
fn test_truncated_record_poisons_parser() {
    let bytes = WireBuilder::little_endian().i32(3).f64(1.0).f64(2.0).build();
    let mut parser = parser(bytes, le_encoding(), CodecConfig::default());

    let err = parser.parse_next_block().unwrap_err();
    assert!(matches!(err, CodecError::Truncated { offset: 20 }));
    assert_eq!(parser.state(), ParserState::Poisoned { offset: 20 });
    assert!(matches!(
        parser.parse_next_block(),
        Err(CodecError::Poisoned { offset: 20 })
    ));
}

#[test]
fn test_iterator_stops_after_poisoning_error() {
    let mut bytes = count_values_record_le(&[1.0]);
    bytes.extend(WireBuilder::little_endian().i32(-2).build());

    let results: Vec<_> = parser(bytes, le_encoding(), CodecConfig::default()).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(CodecError::Parse { offset: 16, .. })));
}

#[test]
fn test_byte_length_ends_the_stream() {
    let mut bytes = count_values_record_le(&[1.0]);
    bytes.extend(count_values_record_le(&[2.0, 3.0]));
    let records_len = bytes.len() as u64;
    bytes.extend(b"trailer");

    let mut encoding = fixtures::count_and_values_le();
    encoding.byte_length = Some(records_len);
    let blocks = decode_all(
        &fixtures::count_and_values(),
        &DataEncoding::Binary(encoding.clone()),
        Bytes::from(bytes.clone()),
        CodecConfig::default(),
    )
    .unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].value(2), Value::Double(3.0));

    // a limit inside the second record cuts it short
    encoding.byte_length = Some(records_len - 4);
    let mut parser = parser(bytes, DataEncoding::Binary(encoding), CodecConfig::default());
    assert!(parser.parse_next_block().unwrap().is_some());
    assert!(matches!(
        parser.parse_next_block(),
        Err(CodecError::Truncated { .. })
    ));
}

#[test]
fn test_array_size_limit() {
    let bytes = count_values_record_le(&[1.0, 2.0, 3.0]);
    let config = CodecConfig {
        max_array_size: 2,
        ..Default::default()
    };
    let mut parser = parser(bytes, le_encoding(), config);
    assert!(matches!(
        parser.parse_next_block(),
        Err(CodecError::Parse { .. })
    ));
}

#[test]
fn test_base64_stream() {
    let text = WireBuilder::little_endian().i32(2).f64(0.5).f64(-0.5).build_base64();
    let encoding = DataEncoding::Binary(
        fixtures::count_and_values_le().with_byte_encoding(ByteEncoding::Base64),
    );

    let blocks = decode_all(
        &fixtures::count_and_values(),
        &encoding,
        Bytes::from(text.clone()),
        CodecConfig::default(),
    )
    .unwrap();
    assert_eq!(blocks.len(), 1);
    assert_block_values!(blocks[0], [Value::Int(2), Value::Double(0.5), Value::Double(-0.5)]);

    let encoded = encode_to_bytes(&fixtures::count_and_values(), &encoding, &blocks).unwrap();
    assert_eq!(encoded, Bytes::from(text));
}

// ============================================================================
// Nested arrays
// ============================================================================

#[test]
fn test_inline_arrays_of_records() {
    let wire = WireBuilder::big_endian()
        .f64(1_705_320_000.0)
        .i32(2)
        .f64(100.0)
        .i32(1)
        .f64(10.5)
        .f64(200.0)
        .i32(2)
        .f64(20.0)
        .f64(21.0)
        .build();

    let blocks = decode_all(
        &fixtures::nested_profile(),
        &be_encoding(),
        Bytes::from(wire.clone()),
        CodecConfig::default(),
    )
    .unwrap();
    assert_eq!(blocks.len(), 1);

    let time = Utc.timestamp_opt(1_705_320_000, 0).unwrap();
    assert_block_values!(
        blocks[0],
        [
            Value::Instant(time),
            Value::Double(100.0),
            Value::Int(1),
            Value::Double(10.5),
            Value::Double(200.0),
            Value::Int(2),
            Value::Double(20.0),
            Value::Double(21.0),
        ]
    );

    let encoded = encode_to_bytes(&fixtures::nested_profile(), &be_encoding(), &blocks).unwrap();
    assert_eq!(encoded.to_vec(), wire);
}

#[test]
fn test_size_field_mismatch_fails_write() {
    let mut schema = fixtures::count_and_values();
    schema.assign_new_data_block().unwrap();
    schema.resize_array_at("values", 2).unwrap();
    schema.set_value_at("count", &Value::Int(3)).unwrap();
    let block = schema.data_alias().unwrap();

    let err = encode_to_bytes(&fixtures::count_and_values(), &le_encoding(), &[block]).unwrap_err();
    assert!(matches!(err, CodecError::Write(_)));
}

// ============================================================================
// Choices
// ============================================================================

fn tagged_wire() -> Vec<u8> {
    WireBuilder::big_endian()
        .string("A1")
        .u8(0)
        .f64(21.5)
        .string("B2")
        .u8(1)
        .f64(42.0)
        .f64(-71.0)
        .build()
}

#[test]
fn test_choice_selector_picks_item() {
    let wire = tagged_wire();
    let mut parser = DataStreamParser::new(
        fixtures::tagged_reading(),
        &be_encoding(),
        &wire[..],
        CodecConfig::default(),
    )
    .unwrap();

    let first = parser.parse_next_block().unwrap().unwrap();
    assert_block_values!(first, [Value::Text("A1".into()), Value::Int(0), Value::Double(21.5)]);
    assert_eq!(
        parser.component().find("reading").unwrap().selected_item().unwrap().name(),
        "temperature"
    );

    let second = parser.parse_next_block().unwrap().unwrap();
    assert_eq!(second.atom_count(), 4);
    assert_eq!(second.value(3), Value::Double(-71.0));
    assert_eq!(
        parser.component().find("reading").unwrap().selected_index().unwrap(),
        Some(1)
    );

    let encoded = encode_to_bytes(&fixtures::tagged_reading(), &be_encoding(), &[first, second]).unwrap();
    assert_eq!(encoded.to_vec(), wire);
}

#[test]
fn test_unknown_choice_item_is_parse_error() {
    let wire = WireBuilder::big_endian().string("X").u8(7).build();
    let mut parser = DataStreamParser::new(
        fixtures::tagged_reading(),
        &be_encoding(),
        &wire[..],
        CodecConfig::default(),
    )
    .unwrap();
    assert!(matches!(
        parser.parse_next_block(),
        Err(CodecError::Parse { offset: 3, .. })
    ));
    assert!(matches!(parser.state(), ParserState::Poisoned { .. }));
}

#[test]
fn test_unselected_choice_cannot_be_written() {
    let mut schema = fixtures::tagged_reading();
    schema.assign_new_data_block().unwrap();
    let block = schema.data_alias().unwrap();
    let err = encode_to_bytes(&fixtures::tagged_reading(), &be_encoding(), &[block]).unwrap_err();
    assert!(matches!(err, CodecError::Write(_)));
}
