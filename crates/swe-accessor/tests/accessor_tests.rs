//! Accessor behavior over fixture schemas, including generated structs.

use bytes::Bytes;
use swe_accessor::{data_accessor, AccessorError, AccessorView, DataAccessor};
use swe_codec::{decode_all, encode_to_bytes, CodecConfig};
use swe_common::{BinaryEncoding, ByteOrder, DataEncoding, DataError, Value};
use test_utils::{assert_block_values, count_values_record_le, fixtures};

data_accessor! {
    /// One sample of a series.
    pub struct Sample {
        get value: f64;
        set set_value: f64;
    }
}

data_accessor! {
    pub struct Series {
        get count: i32;
        #[path = "values"]
        count num_values;
        #[path = "values"]
        resize set_num_values;
        #[path = "values"]
        element value: Sample;
        add add_value: Sample;
    }
}

data_accessor! {
    pub struct Weather {
        get station: String;
        get temperature: f64;
        set set_temperature: f64;
        get valid: bool;
    }
}

data_accessor! {
    pub struct Reflectivity {
        get sample: f64;
        set set_sample: f64;
    }
}

data_accessor! {
    pub struct Level {
        get height: f64;
        set set_height: f64;
        get num_samples: i32;
        #[path = "samples"]
        count sample_count;
        add add_sample: Reflectivity;
    }
}

data_accessor! {
    pub struct Profile {
        #[path = "levels"]
        count num_levels;
        add add_level: Level;
        #[path = "levels"]
        element level: Level;
    }
}

data_accessor! {
    pub struct Tagged {
        set set_id: String;
        select reading;
        #[path = "reading/temperature"]
        set set_temperature: f64;
    }
}

// ============================================================================
// Scalars and rebinding
// ============================================================================

#[test]
fn test_rewrap_keeps_resolved_paths() {
    let schema = fixtures::weather_observation();
    let blocks = decode_all(
        &schema,
        &DataEncoding::Text(fixtures::csv_encoding()),
        Bytes::from_static(fixtures::WEATHER_CSV.as_bytes()),
        CodecConfig::default(),
    )
    .unwrap();

    let mut weather = Weather::new(&schema);
    weather.wrap(blocks[0].alias());
    assert_eq!(weather.station().unwrap(), "KBOS");
    assert_eq!(weather.temperature().unwrap(), -3.5);
    assert!(weather.valid().unwrap());

    weather.wrap(blocks[1].alias());
    assert_eq!(weather.station().unwrap(), "KJFK");
    assert!(!weather.valid().unwrap());

    weather.set_temperature(4.0).unwrap();
    assert_eq!(blocks[1].get_double(2).unwrap(), 4.0);
    assert_eq!(blocks[0].get_double(2).unwrap(), -3.5);
}

#[test]
fn test_unknown_method_fails_on_first_call() {
    let schema = fixtures::weather_observation();
    let mut accessor = DataAccessor::new(&schema);
    accessor.wrap(schema.create_data_block().unwrap());

    assert!(matches!(
        accessor.get::<f64>("get_humidity"),
        Err(AccessorError::Unresolved(_))
    ));
    assert!(matches!(
        accessor.get_value("get_pressure"),
        Ok(Value::Double(_))
    ));
}

#[test]
fn test_explicit_path_to_missing_component() {
    let schema = fixtures::weather_observation();
    let mut accessor = DataAccessor::new(&schema).with_binding("get_dew_point", "dew/point");
    accessor.wrap(schema.create_data_block().unwrap());
    assert!(matches!(
        accessor.get::<f64>("get_dew_point"),
        Err(AccessorError::Data(DataError::PathNotFound(_)))
    ));
}

#[test]
fn test_wrong_block_shape_fails_on_first_call() {
    let schema = fixtures::weather_observation();
    let mut weather = Weather::new(&schema);
    weather.wrap(fixtures::count_and_values().create_data_block().unwrap());
    assert!(matches!(
        weather.station(),
        Err(AccessorError::Data(DataError::BlockMismatch { .. }))
    ));
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn test_add_updates_size_field_and_block() {
    let schema = fixtures::count_and_values();
    let mut series = Series::new(&schema);
    series.wrap(schema.create_data_block().unwrap());

    for v in [1.0, 2.0, 3.5] {
        let mut sample = series.add_value().unwrap();
        sample.set_value(v).unwrap();
    }
    assert_eq!(series.num_values().unwrap(), 3);
    assert_eq!(series.count().unwrap(), 3);
    assert_eq!(series.value(1).unwrap().value().unwrap(), 2.0);

    let block = series.accessor_mut().data().unwrap();
    assert_block_values!(
        block,
        [Value::Int(3), Value::Double(1.0), Value::Double(2.0), Value::Double(3.5)]
    );

    let encoded = encode_to_bytes(
        &schema,
        &DataEncoding::Binary(fixtures::count_and_values_le()),
        &[block],
    )
    .unwrap();
    assert_eq!(encoded.to_vec(), count_values_record_le(&[1.0, 2.0, 3.5]));
}

#[test]
fn test_resize_and_element_bounds() {
    let schema = fixtures::count_and_values();
    let mut series = Series::new(&schema);
    series.wrap(schema.create_data_block().unwrap());

    series.set_num_values(2).unwrap();
    assert_eq!(series.count().unwrap(), 2);
    assert!(series.value(1).is_ok());
    assert!(matches!(
        series.value(2),
        Err(AccessorError::Data(DataError::Structure(_)))
    ));
}

#[test]
fn test_add_on_fixed_array_is_rejected() {
    let schema = fixtures::tagged_reading();
    let mut accessor = DataAccessor::new(&schema).with_binding("add_coordinate", "reading/position");
    accessor.wrap(schema.create_data_block().unwrap());
    assert!(matches!(
        accessor.add("add_coordinate"),
        Err(AccessorError::IncompatibleKind { .. })
    ));
}

#[test]
fn test_nested_record_elements() {
    let schema = fixtures::nested_profile();
    let mut profile = Profile::new(&schema);
    profile.wrap(schema.create_data_block().unwrap());

    let mut low = profile.add_level().unwrap();
    let mut high = profile.add_level().unwrap();
    low.set_height(100.0).unwrap();
    high.set_height(250.0).unwrap();

    assert_eq!(profile.num_levels().unwrap(), 2);
    assert_eq!(profile.level(0).unwrap().height().unwrap(), 100.0);
    let mut second = profile.level(1).unwrap();
    assert_eq!(second.height().unwrap(), 250.0);
    assert_eq!(second.num_samples().unwrap(), 0);

    // time + 2 * (height, num_samples)
    assert_eq!(profile.accessor_mut().data().unwrap().atom_count(), 5);
}

#[test]
fn test_add_inside_element_reshapes_parent() {
    let schema = fixtures::nested_profile();
    let mut profile = Profile::new(&schema);
    profile.wrap(schema.create_data_block().unwrap());

    let mut level = profile.add_level().unwrap();
    level.set_height(100.0).unwrap();
    let mut sample = level.add_sample().unwrap();
    sample.set_sample(4.5).unwrap();

    assert_eq!(level.num_samples().unwrap(), 1);
    assert_eq!(level.sample_count().unwrap(), 1);
    assert_eq!(profile.level(0).unwrap().num_samples().unwrap(), 1);

    let block = profile.accessor_mut().data().unwrap();
    // time, height, num_samples, sample
    assert_eq!(block.atom_count(), 4);
    assert_eq!(block.value(2), Value::Int(1));
    assert_eq!(block.value(3), Value::Double(4.5));

    let encoding = DataEncoding::Binary(BinaryEncoding::new(ByteOrder::BigEndian));
    let encoded = encode_to_bytes(&schema, &encoding, &[block]).unwrap();
    let decoded = decode_all(&schema, &encoding, encoded, CodecConfig::default()).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].atom_count(), 4);
    assert_eq!(decoded[0].value(3), Value::Double(4.5));
}

#[test]
fn test_element_view_fails_after_parent_shrinks() {
    let schema = fixtures::nested_profile();
    let mut profile = Profile::new(&schema);
    profile.wrap(schema.create_data_block().unwrap());

    profile.add_level().unwrap();
    let mut second = profile.add_level().unwrap();
    second.set_height(250.0).unwrap();

    profile.accessor_mut().set_num("add_level", 1).unwrap();
    assert_eq!(profile.num_levels().unwrap(), 1);
    assert!(matches!(
        second.height(),
        Err(AccessorError::Data(DataError::Structure(_)))
    ));
}

// ============================================================================
// Choices
// ============================================================================

#[test]
fn test_choice_selection_through_accessor() {
    let schema = fixtures::tagged_reading();
    let mut tagged = Tagged::new(&schema);
    tagged.wrap(schema.create_data_block().unwrap());

    tagged.set_id("A1".to_string()).unwrap();
    assert!(tagged.set_temperature(20.0).is_err());

    tagged.reading("temperature").unwrap();
    tagged.set_temperature(21.5).unwrap();
    assert_eq!(tagged.accessor_mut().selected("reading").unwrap(), "temperature");

    let block = tagged.accessor_mut().data().unwrap();
    assert_block_values!(block, [Value::Text("A1".into()), Value::Int(0), Value::Double(21.5)]);
}
