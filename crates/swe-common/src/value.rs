//! Scalar value kinds and the coercion rules between them.
//!
//! Every data block stores one primitive kind, but every block can be read
//! and written as any other kind. All coercions go through [`Value`], so the
//! rules live in exactly one place:
//!
//! - numeric kinds convert freely, with integer narrowing range-checked
//! - floating point to boolean is "nonzero beyond machine epsilon"
//! - text converts to anything by parsing, and anything converts to text
//! - instants and offset date-times convert to each other, to epoch seconds
//!   (`float`/`double`) and to epoch milliseconds (`long`)
//! - anything else (boolean to instant, instant to short, ...) is a
//!   [`DataError::Conversion`]

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DataError, DataResult};

/// Primitive storage kind of a data block or scalar component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    #[serde(rename = "string")]
    Utf8String,
    Instant,
    #[serde(rename = "datetime")]
    DateTime,
}

impl DataType {
    /// Get the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Utf8String => "string",
            Self::Instant => "instant",
            Self::DateTime => "datetime",
        }
    }

    /// Whether this is one of the integer kinds.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Int | Self::Long)
    }

    /// Whether this is a timestamp kind.
    pub fn is_time(&self) -> bool {
        matches!(self, Self::Instant | Self::DateTime)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single scalar value of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Instant(DateTime<Utc>),
    DateTime(DateTime<FixedOffset>),
}

impl Value {
    /// Storage kind of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Boolean(_) => DataType::Boolean,
            Value::Byte(_) => DataType::Byte,
            Value::Short(_) => DataType::Short,
            Value::Int(_) => DataType::Int,
            Value::Long(_) => DataType::Long,
            Value::Float(_) => DataType::Float,
            Value::Double(_) => DataType::Double,
            Value::Text(_) => DataType::Utf8String,
            Value::Instant(_) => DataType::Instant,
            Value::DateTime(_) => DataType::DateTime,
        }
    }

    /// Default (zero) value of a storage kind.
    pub fn default_for(data_type: DataType) -> Value {
        match data_type {
            DataType::Boolean => Value::Boolean(false),
            DataType::Byte => Value::Byte(0),
            DataType::Short => Value::Short(0),
            DataType::Int => Value::Int(0),
            DataType::Long => Value::Long(0),
            DataType::Float => Value::Float(0.0),
            DataType::Double => Value::Double(0.0),
            DataType::Utf8String => Value::Text(String::new()),
            DataType::Instant => Value::Instant(DateTime::<Utc>::default()),
            DataType::DateTime => Value::DateTime(DateTime::<FixedOffset>::default()),
        }
    }

    /// Convert this value to another storage kind.
    pub fn coerce(&self, to: DataType) -> DataResult<Value> {
        Ok(match to {
            DataType::Boolean => Value::Boolean(self.as_boolean()?),
            DataType::Byte => Value::Byte(self.as_byte()?),
            DataType::Short => Value::Short(self.as_short()?),
            DataType::Int => Value::Int(self.as_int()?),
            DataType::Long => Value::Long(self.as_long()?),
            DataType::Float => Value::Float(self.as_float()?),
            DataType::Double => Value::Double(self.as_double()?),
            DataType::Utf8String => Value::Text(self.as_text()),
            DataType::Instant => Value::Instant(self.as_instant()?),
            DataType::DateTime => Value::DateTime(self.as_date_time()?),
        })
    }

    pub fn as_boolean(&self) -> DataResult<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::Byte(v) => Ok(*v != 0),
            Value::Short(v) => Ok(*v != 0),
            Value::Int(v) => Ok(*v != 0),
            Value::Long(v) => Ok(*v != 0),
            Value::Float(v) => Ok(v.abs() > f32::EPSILON),
            Value::Double(v) => Ok(v.abs() > f64::EPSILON),
            Value::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                other => Err(self.fail(DataType::Boolean, format!("'{}' is not a boolean", other))),
            },
            Value::Instant(_) | Value::DateTime(_) => {
                Err(self.fail(DataType::Boolean, "timestamps have no boolean meaning"))
            }
        }
    }

    pub fn as_byte(&self) -> DataResult<i8> {
        let v = self.integer(DataType::Byte)?;
        i8::try_from(v).map_err(|_| self.fail(DataType::Byte, format!("{} is out of range", v)))
    }

    pub fn as_short(&self) -> DataResult<i16> {
        let v = self.integer(DataType::Short)?;
        i16::try_from(v).map_err(|_| self.fail(DataType::Short, format!("{} is out of range", v)))
    }

    pub fn as_int(&self) -> DataResult<i32> {
        let v = self.integer(DataType::Int)?;
        i32::try_from(v).map_err(|_| self.fail(DataType::Int, format!("{} is out of range", v)))
    }

    /// Read as a long. Timestamps read as epoch milliseconds.
    pub fn as_long(&self) -> DataResult<i64> {
        match self {
            Value::Instant(t) => Ok(t.timestamp_millis()),
            Value::DateTime(t) => Ok(t.timestamp_millis()),
            _ => self.integer(DataType::Long),
        }
    }

    pub fn as_float(&self) -> DataResult<f32> {
        match self {
            Value::Float(v) => Ok(*v),
            _ => self.as_double().map(|v| v as f32),
        }
    }

    /// Read as a double. Timestamps read as epoch seconds.
    pub fn as_double(&self) -> DataResult<f64> {
        match self {
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Byte(v) => Ok(*v as f64),
            Value::Short(v) => Ok(*v as f64),
            Value::Int(v) => Ok(*v as f64),
            Value::Long(v) => Ok(*v as f64),
            Value::Float(v) => Ok(*v as f64),
            Value::Double(v) => Ok(*v),
            Value::Text(s) => parse_double(s)
                .ok_or_else(|| self.fail(DataType::Double, format!("'{}' is not a number", s))),
            Value::Instant(t) => Ok(epoch_seconds(t)),
            Value::DateTime(t) => Ok(epoch_seconds(t)),
        }
    }

    /// Textual form of any value. Never fails.
    pub fn as_text(&self) -> String {
        match self {
            Value::Boolean(b) => b.to_string(),
            Value::Byte(v) => v.to_string(),
            Value::Short(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::Float(v) if v.is_finite() => v.to_string(),
            Value::Float(v) => format_double(*v as f64),
            Value::Double(v) => format_double(*v),
            Value::Text(s) => s.clone(),
            Value::Instant(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Value::DateTime(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        }
    }

    /// Read as an absolute instant.
    ///
    /// Doubles are epoch seconds and longs are epoch milliseconds.
    pub fn as_instant(&self) -> DataResult<DateTime<Utc>> {
        match self {
            Value::Instant(t) => Ok(*t),
            Value::DateTime(t) => Ok(t.with_timezone(&Utc)),
            Value::Double(_) | Value::Float(_) => {
                let secs = self.as_double()?;
                from_epoch_seconds(secs)
                    .ok_or_else(|| self.fail(DataType::Instant, format!("{} is not a valid epoch time", secs)))
            }
            Value::Long(ms) => DateTime::<Utc>::from_timestamp_millis(*ms)
                .ok_or_else(|| self.fail(DataType::Instant, format!("{} ms is out of range", ms))),
            Value::Text(s) => parse_instant(s)
                .ok_or_else(|| self.fail(DataType::Instant, format!("'{}' is not an ISO 8601 time", s))),
            Value::Boolean(_) | Value::Byte(_) | Value::Short(_) | Value::Int(_) => Err(self.fail(
                DataType::Instant,
                "only double seconds or long milliseconds convert to time",
            )),
        }
    }

    /// Read as a date-time carrying an explicit zone offset.
    ///
    /// Everything that converts to an instant converts here with a UTC offset.
    pub fn as_date_time(&self) -> DataResult<DateTime<FixedOffset>> {
        match self {
            Value::DateTime(t) => Ok(*t),
            Value::Text(s) => match DateTime::parse_from_rfc3339(s.trim()) {
                Ok(t) => Ok(t),
                Err(_) => self.as_instant().map(|t| t.with_timezone(&Utc.fix())),
            },
            _ => self.as_instant().map(|t| t.with_timezone(&Utc.fix())),
        }
    }

    /// Integer view used by all integer targets.
    fn integer(&self, to: DataType) -> DataResult<i64> {
        match self {
            Value::Boolean(b) => Ok(*b as i64),
            Value::Byte(v) => Ok(*v as i64),
            Value::Short(v) => Ok(*v as i64),
            Value::Int(v) => Ok(*v as i64),
            Value::Long(v) => Ok(*v),
            Value::Float(v) => self.truncate(*v as f64, to),
            Value::Double(v) => self.truncate(*v, to),
            Value::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| self.fail(to, format!("'{}' is not an integer", s))),
            Value::Instant(_) | Value::DateTime(_) => {
                Err(self.fail(to, "timestamps only convert to long milliseconds"))
            }
        }
    }

    fn truncate(&self, v: f64, to: DataType) -> DataResult<i64> {
        if !v.is_finite() || v >= i64::MAX as f64 || v < i64::MIN as f64 {
            return Err(self.fail(to, format!("{} has no integer value", v)));
        }
        Ok(v.trunc() as i64)
    }

    fn fail(&self, to: DataType, reason: impl Into<String>) -> DataError {
        DataError::conversion(self.data_type(), to, reason)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

// ============================================================================
// Atom: primitives that can live in a scalar block
// ============================================================================

/// A primitive that can be stored in a scalar data block.
pub trait Atom: Clone + Default + fmt::Debug + PartialEq + 'static {
    const DATA_TYPE: DataType;

    fn to_value(&self) -> Value;

    fn from_value(value: &Value) -> DataResult<Self>;
}

macro_rules! impl_atom {
    ($ty:ty, $kind:ident, $variant:ident, $getter:ident) => {
        impl Atom for $ty {
            const DATA_TYPE: DataType = DataType::$kind;

            fn to_value(&self) -> Value {
                Value::$variant(*self)
            }

            fn from_value(value: &Value) -> DataResult<Self> {
                value.$getter()
            }
        }
    };
}

impl_atom!(bool, Boolean, Boolean, as_boolean);
impl_atom!(i8, Byte, Byte, as_byte);
impl_atom!(i16, Short, Short, as_short);
impl_atom!(i32, Int, Int, as_int);
impl_atom!(i64, Long, Long, as_long);
impl_atom!(f32, Float, Float, as_float);
impl_atom!(f64, Double, Double, as_double);
impl_atom!(DateTime<Utc>, Instant, Instant, as_instant);
impl_atom!(DateTime<FixedOffset>, DateTime, DateTime, as_date_time);

impl Atom for String {
    const DATA_TYPE: DataType = DataType::Utf8String;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: &Value) -> DataResult<Self> {
        Ok(value.as_text())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse a floating point token, accepting the SWE spellings of infinity.
pub fn parse_double(s: &str) -> Option<f64> {
    match s.trim() {
        "NaN" | "nan" => Some(f64::NAN),
        "INF" | "+INF" | "inf" | "+inf" => Some(f64::INFINITY),
        "-INF" | "-inf" => Some(f64::NEG_INFINITY),
        other => other.parse::<f64>().ok(),
    }
}

/// Format a double as its shortest round-tripping text.
pub fn format_double(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        v.to_string()
    }
}

/// Parse an ISO 8601 time, assuming UTC when no offset is given.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&ndt));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

fn epoch_seconds<Tz: TimeZone>(t: &DateTime<Tz>) -> f64 {
    t.timestamp() as f64 + t.timestamp_subsec_nanos() as f64 / 1e9
}

fn from_epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let mut whole = secs.floor();
    let mut nanos = ((secs - whole) * 1e9).round();
    if nanos >= 1e9 {
        whole += 1.0;
        nanos -= 1e9;
    }
    if whole >= i64::MAX as f64 || whole < i64::MIN as f64 {
        return None;
    }
    DateTime::<Utc>::from_timestamp(whole as i64, nanos as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_double_to_boolean_uses_epsilon() {
        assert!(!Value::Double(0.0).as_boolean().unwrap());
        assert!(!Value::Double(f64::EPSILON / 2.0).as_boolean().unwrap());
        assert!(Value::Double(0.5).as_boolean().unwrap());
        assert!(Value::Double(-3.0).as_boolean().unwrap());
    }

    #[test]
    fn test_text_parses_to_numbers() {
        assert_eq!(Value::Text(" 42 ".into()).as_int().unwrap(), 42);
        assert_eq!(Value::Text("2.5".into()).as_double().unwrap(), 2.5);
        assert!(Value::Text("abc".into()).as_int().unwrap_err().is_conversion());
        assert!(Value::Text("2.5".into()).as_int().is_err());
    }

    #[test]
    fn test_integer_narrowing_is_range_checked() {
        assert_eq!(Value::Long(127).as_byte().unwrap(), 127);
        assert!(Value::Long(128).as_byte().is_err());
        assert!(Value::Double(1e12).as_int().is_err());
        assert_eq!(Value::Double(-3.9).as_int().unwrap(), -3);
        assert!(Value::Double(f64::NAN).as_long().is_err());
    }

    #[test]
    fn test_boolean_to_instant_fails() {
        let err = Value::Boolean(true).as_instant().unwrap_err();
        assert!(matches!(
            err,
            DataError::Conversion {
                from: DataType::Boolean,
                to: DataType::Instant,
                ..
            }
        ));
        assert!(Value::Instant(Utc::now()).as_boolean().is_err());
        assert!(Value::Instant(Utc::now()).as_short().is_err());
    }

    #[test]
    fn test_instant_epoch_conversions() {
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let secs = Value::Instant(t).as_double().unwrap();
        assert_eq!(secs, 1_705_320_000.0);
        assert_eq!(Value::Instant(t).as_long().unwrap(), 1_705_320_000_000);
        assert_eq!(Value::Double(secs).as_instant().unwrap(), t);
        assert_eq!(Value::Long(1_705_320_000_000).as_instant().unwrap(), t);
    }

    #[test]
    fn test_double_instant_round_trip_sub_microsecond() {
        let secs = 1_700_000_000.123_456;
        let t = Value::Double(secs).as_instant().unwrap();
        let back = Value::Instant(t).as_double().unwrap();
        assert!((back - secs).abs() < 1e-6);
    }

    #[test]
    fn test_date_time_keeps_offset() {
        let v = Value::Text("2024-03-01T10:30:00+02:00".into());
        let dt = v.as_date_time().unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 7200);
        let instant = Value::DateTime(dt).as_instant().unwrap();
        assert_eq!(instant.hour(), 8);
        assert_eq!(instant.day(), 1);
    }

    #[test]
    fn test_text_forms() {
        assert_eq!(Value::Double(1.5).as_text(), "1.5");
        assert_eq!(Value::Double(f64::INFINITY).as_text(), "INF");
        assert_eq!(Value::Boolean(true).as_text(), "true");
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(Value::Instant(t).as_text(), "2024-01-15T12:00:00Z");
    }

    #[test]
    fn test_parse_instant_without_zone() {
        let t = parse_instant("2024-01-15T12:00:00").unwrap();
        assert_eq!(t.year(), 2024);
        assert_eq!(t.hour(), 12);
        assert!(parse_instant("2024-01-15").is_some());
        assert!(parse_instant("yesterday").is_none());
    }

    #[test]
    fn test_coerce_all_to_text_and_back() {
        let values = [
            Value::Byte(-5),
            Value::Short(1200),
            Value::Int(-70000),
            Value::Long(1 << 40),
            Value::Double(0.25),
            Value::Boolean(false),
        ];
        for v in values {
            let text = v.coerce(DataType::Utf8String).unwrap();
            assert_eq!(text.coerce(v.data_type()).unwrap(), v);
        }
    }
}
