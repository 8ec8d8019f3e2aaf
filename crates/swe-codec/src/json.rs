//! JSON stream codec.
//!
//! Each record is one JSON value: records map to objects keyed by field
//! name, arrays to JSON arrays, choices to a single-key object naming the
//! selected item, and scalars to numbers, strings or booleans. Non-finite
//! numbers are written as the strings `"NaN"`, `"INF"` and `"-INF"`.
//! Records are separated by newlines on output; any whitespace is accepted
//! between records on input.

use std::io::{Read, Write};

use serde_json::de::IoRead;
use serde_json::{Map, Number, StreamDeserializer};
use swe_common::value::format_double;
use swe_common::{
    ComponentKind, DataBlock, DataComponent, DataError, DataType, ElementCount, JsonEncoding,
    SiblingScope, Value,
};
use tracing::trace;

use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::walk::{checked_size, push_path};

type Json = serde_json::Value;

// ============================================================================
// Reading
// ============================================================================

/// Record reader over a stream of JSON values.
pub struct JsonReader<R: Read> {
    values: StreamDeserializer<'static, IoRead<R>, Json>,
}

impl<R: Read> JsonReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            values: serde_json::Deserializer::from_reader(input).into_iter(),
        }
    }

    /// Offset just past the last value read.
    pub fn offset(&self) -> u64 {
        self.values.byte_offset() as u64
    }

    /// Decode the next JSON value into the block bound to `root`.
    ///
    /// Returns false at end of stream.
    pub fn read_record(&mut self, root: &mut DataComponent, config: &CodecConfig) -> CodecResult<bool> {
        let start = self.offset();
        let json = match self.values.next() {
            None => return Ok(false),
            Some(Ok(json)) => json,
            Some(Err(e)) if e.is_eof() => return Err(CodecError::Truncated { offset: start }),
            Some(Err(e)) if e.is_io() => return Err(CodecError::Io(e.into())),
            Some(Err(e)) => return Err(CodecError::parse(start, e.to_string())),
        };
        let mut path = String::new();
        read_json(root, &json, &SiblingScope::root(), &mut path, start, config)?;
        trace!(start, end = self.offset(), "decoded JSON record");
        Ok(true)
    }
}

fn mismatch(offset: u64, path: &str, expected: &str, found: &Json) -> CodecError {
    let found = match found {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    };
    CodecError::parse(offset, format!("'{}': expected {}, found {}", path, expected, found))
}

fn json_scalar(json: &Json, offset: u64, path: &str) -> CodecResult<Value> {
    match json {
        Json::Bool(b) => Ok(Value::Boolean(*b)),
        Json::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(v), _) => Ok(Value::Long(v)),
            (None, Some(v)) => Ok(Value::Double(v)),
            (None, None) => Err(CodecError::parse(offset, format!("'{}': {} out of range", path, n))),
        },
        Json::String(s) => Ok(Value::Text(s.clone())),
        other => Err(mismatch(offset, path, "a scalar", other)),
    }
}

fn read_json(
    component: &mut DataComponent,
    json: &Json,
    scope: &SiblingScope<'_>,
    path: &mut String,
    offset: u64,
    config: &CodecConfig,
) -> CodecResult<()> {
    match component.kind() {
        ComponentKind::Scalar(_) => {
            let value = json_scalar(json, offset, path)?;
            component.set_value(&value).map_err(|err| match err {
                DataError::Conversion { .. } => CodecError::parse(offset, format!("'{}': {}", path, err)),
                other => other.into(),
            })
        }

        ComponentKind::Record(_) => {
            let object = json
                .as_object()
                .ok_or_else(|| mismatch(offset, path, "an object", json))?;
            component.for_each_field_mut(Some(scope), |field, inner| {
                let mark = push_path(path, field.name());
                let result = match object.get(field.name()) {
                    Some(Json::Null) | None if field.is_optional() => Ok(()),
                    Some(child) => read_json(field, child, inner, path, offset, config),
                    None => Err(CodecError::parse(offset, format!("missing field '{}'", path))),
                };
                path.truncate(mark);
                result
            })
        }

        ComponentKind::Array(array) => {
            let items = json
                .as_array()
                .ok_or_else(|| mismatch(offset, path, "an array", json))?;
            let size = checked_size(items.len() as i64, offset, path, config)?;
            match array.element_count() {
                ElementCount::Fixed(n) if *n != size => {
                    return Err(CodecError::parse(
                        offset,
                        format!("'{}' must have {} elements, found {}", path, n, size),
                    ))
                }
                ElementCount::Sibling(name) => {
                    let declared = scope.count_of(name)?;
                    if declared != size {
                        return Err(CodecError::parse(
                            offset,
                            format!(
                                "'{}' has {} elements but size field '{}' holds {}",
                                path, size, name, declared
                            ),
                        ));
                    }
                }
                _ => {}
            }
            component.resize_array(size)?;
            component.for_each_element_mut(scope, |i, element, scope| {
                read_json(element, &items[i], scope, path, offset, config)
            })
        }

        ComponentKind::Choice(_) => {
            let (name, value) = match json.as_object() {
                Some(object) if object.len() == 1 => object
                    .iter()
                    .next()
                    .ok_or_else(|| mismatch(offset, path, "a single-key object", json))?,
                _ => return Err(mismatch(offset, path, "a single-key object", json)),
            };
            let index = component.child_index(name).ok_or_else(|| {
                CodecError::parse(offset, format!("'{}' is not an item of choice '{}'", name, path))
            })?;
            let reuse = component.selected_index()? == Some(index) && component.selected_item()?.has_data();
            if !reuse {
                component.select_item(index)?;
            }
            let item = component.selected_item_mut()?;
            let mark = push_path(path, name);
            let result = read_json(item, value, scope, path, offset, config);
            path.truncate(mark);
            component.sync_selected_item();
            result
        }
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Record writer producing newline separated JSON values.
pub struct JsonWriter<W: Write> {
    output: W,
    pretty: bool,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(output: W, encoding: &JsonEncoding) -> Self {
        Self {
            output,
            pretty: encoding.pretty,
        }
    }

    /// Encode `block` as one JSON value, using `root` to interpret it.
    ///
    /// Nothing is written when the block cannot be encoded.
    pub fn write_record(&mut self, root: &mut DataComponent, block: &DataBlock) -> CodecResult<()> {
        root.assign(block.alias())?;
        let mut path = String::new();
        let json = to_json(root, &SiblingScope::root(), &mut path)?;
        let text = if self.pretty {
            serde_json::to_vec_pretty(&json)
        } else {
            serde_json::to_vec(&json)
        }
        .map_err(|e| CodecError::write(e.to_string()))?;
        self.output.write_all(&text)?;
        self.output.write_all(b"\n")?;
        Ok(())
    }

    pub fn finish(mut self) -> CodecResult<W> {
        self.output.flush()?;
        Ok(self.output)
    }
}

fn scalar_json(data_type: DataType, value: &Value) -> Json {
    match value {
        Value::Boolean(b) => Json::Bool(*b),
        Value::Byte(_) | Value::Short(_) | Value::Int(_) | Value::Long(_) => match value.as_long() {
            Ok(v) => Json::Number(v.into()),
            Err(_) => Json::String(value.as_text()),
        },
        Value::Float(_) | Value::Double(_) => {
            let v = value.as_double().unwrap_or(f64::NAN);
            match Number::from_f64(v) {
                Some(n) if data_type != DataType::Float => Json::Number(n),
                // f32 values go through their shortest decimal form
                Some(_) => value
                    .as_text()
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Json::Number)
                    .unwrap_or(Json::Null),
                None => Json::String(format_double(v)),
            }
        }
        Value::Text(_) | Value::Instant(_) | Value::DateTime(_) => Json::String(value.as_text()),
    }
}

fn to_json(component: &mut DataComponent, scope: &SiblingScope<'_>, path: &mut String) -> CodecResult<Json> {
    match component.kind() {
        ComponentKind::Scalar(scalar) => {
            let data_type = scalar.data_type();
            Ok(scalar_json(data_type, &component.value()?))
        }

        ComponentKind::Record(_) => {
            let mut object = Map::new();
            component.for_each_field_mut(Some(scope), |field, inner| {
                let mark = push_path(path, field.name());
                let result = to_json(field, inner, path);
                path.truncate(mark);
                object.insert(field.name().to_string(), result?);
                Ok::<(), CodecError>(())
            })?;
            Ok(Json::Object(object))
        }

        ComponentKind::Array(array) => {
            if let ElementCount::Sibling(name) = array.element_count() {
                let size = component.array_size()?;
                let declared = scope.count_of(name)?;
                if declared != size {
                    return Err(CodecError::write(format!(
                        "array '{}' has {} elements but size field '{}' holds {}",
                        path, size, name, declared
                    )));
                }
            }
            let mut items = Vec::new();
            component.for_each_element_mut(scope, |_, element, scope| {
                items.push(to_json(element, scope, path)?);
                Ok::<(), CodecError>(())
            })?;
            Ok(Json::Array(items))
        }

        ComponentKind::Choice(_) => {
            if component.selected_index()?.is_none() {
                return Err(CodecError::write(format!("choice '{}' has no selected item", path)));
            }
            let item = component.selected_item_mut()?;
            let name = item.name().to_string();
            let mark = push_path(path, &name);
            let value = to_json(item, scope, path);
            path.truncate(mark);
            let mut object = Map::new();
            object.insert(name, value?);
            Ok(Json::Object(object))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_numbers_become_strings() {
        assert_eq!(
            scalar_json(DataType::Double, &Value::Double(f64::INFINITY)),
            Json::String("INF".into())
        );
        assert_eq!(
            scalar_json(DataType::Float, &Value::Float(0.1)),
            serde_json::json!(0.1)
        );
        assert_eq!(scalar_json(DataType::Int, &Value::Int(-4)), serde_json::json!(-4));
    }

    #[test]
    fn test_scalar_rejects_containers() {
        assert!(json_scalar(&serde_json::json!([1]), 0, "x").is_err());
        assert_eq!(
            json_scalar(&serde_json::json!(2.5), 0, "x").unwrap(),
            Value::Double(2.5)
        );
    }

    #[test]
    fn test_reader_reports_end_of_stream() {
        let mut reader = JsonReader::new(&b" \n"[..]);
        let mut root = DataComponent::record("r", vec![DataComponent::count("n")]);
        root.assign_new_data_block().unwrap();
        assert!(!reader.read_record(&mut root, &CodecConfig::default()).unwrap());
    }
}
