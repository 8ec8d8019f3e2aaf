//! Sample schemas and encodings used across the test suites.
//!
//! Every schema builder returns a fresh, unbound tree.

use swe_common::{
    BinaryDataType, BinaryEncoding, ByteOrder, DataComponent, ElementCount, TextEncoding,
};

/// `{ count: int; values: array<double> sized by count }`.
pub fn count_and_values() -> DataComponent {
    DataComponent::record(
        "measurement",
        vec![
            DataComponent::count("count"),
            DataComponent::array(
                "values",
                DataComponent::quantity("value", "m"),
                ElementCount::Sibling("count".to_string()),
            ),
        ],
    )
}

/// Little-endian encoding for [`count_and_values`]: 4-byte count, 8-byte values.
pub fn count_and_values_le() -> BinaryEncoding {
    BinaryEncoding::new(ByteOrder::LittleEndian)
        .with_member("count", BinaryDataType::SignedInt)
        .with_member("values/value", BinaryDataType::Float64)
}

/// A flat weather observation: time, station id, temperature, pressure, flag.
pub fn weather_observation() -> DataComponent {
    DataComponent::record(
        "weather",
        vec![
            DataComponent::time("time"),
            DataComponent::category("station"),
            DataComponent::quantity("temperature", "Cel"),
            DataComponent::quantity("pressure", "hPa"),
            DataComponent::boolean("valid"),
        ],
    )
}

/// Profile with nested variable arrays:
/// `{ time; levels: inline array<{ height; samples: count + array<double> }> }`.
pub fn nested_profile() -> DataComponent {
    DataComponent::record(
        "profile",
        vec![
            DataComponent::time("time"),
            DataComponent::array(
                "levels",
                DataComponent::record(
                    "level",
                    vec![
                        DataComponent::quantity("height", "m"),
                        DataComponent::count("num_samples"),
                        DataComponent::array(
                            "samples",
                            DataComponent::quantity("sample", "dBZ"),
                            ElementCount::Sibling("num_samples".to_string()),
                        ),
                    ],
                ),
                ElementCount::Inline,
            ),
        ],
    )
}

/// `{ id: text; reading: choice { temperature | position: [lat, lon] } }`.
pub fn tagged_reading() -> DataComponent {
    DataComponent::record(
        "message",
        vec![
            DataComponent::text("id"),
            DataComponent::choice(
                "reading",
                vec![
                    DataComponent::quantity("temperature", "Cel"),
                    DataComponent::array(
                        "position",
                        DataComponent::quantity("coordinate", "deg"),
                        ElementCount::Fixed(2),
                    ),
                ],
            ),
        ],
    )
}

/// Comma separated values, one record per line.
pub fn csv_encoding() -> TextEncoding {
    TextEncoding::new(",", "\n")
}

/// Schema definition document equivalent to [`weather_observation`].
pub const WEATHER_DEF_JSON: &str = r#"{
    "name": "weather",
    "type": "record",
    "fields": [
        { "name": "time", "type": "time", "uom": "http://www.opengis.net/def/uom/ISO-8601/0/Gregorian" },
        { "name": "station", "type": "category" },
        { "name": "temperature", "type": "quantity", "uom": "Cel" },
        { "name": "pressure", "type": "quantity", "uom": "hPa" },
        { "name": "valid", "type": "boolean" }
    ]
}"#;

/// YAML definition of [`count_and_values`].
pub const COUNT_AND_VALUES_DEF_YAML: &str = r#"
name: measurement
type: record
fields:
  - name: count
    type: count
  - name: values
    type: array
    element_count:
      sibling: count
    element:
      name: value
      type: quantity
      uom: m
"#;

/// Text encoding document for [`WEATHER_DEF_JSON`].
pub const CSV_ENCODING_JSON: &str = r#"{ "type": "text", "token_separator": ",", "block_separator": "\n" }"#;

/// Two weather records in CSV.
pub const WEATHER_CSV: &str = "2024-01-15T12:00:00Z,KBOS,-3.5,1012.25,true\n\
                               2024-01-15T13:00:00Z,KJFK,1.25,1009.5,false\n";
