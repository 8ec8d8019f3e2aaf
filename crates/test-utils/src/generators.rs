//! Wire generators producing known byte and text sequences.
//!
//! Tests build expected streams with these instead of going through the
//! codec under test.

use base64::{engine::general_purpose::STANDARD, Engine};

/// Builder for binary streams with explicit widths and byte order.
///
/// # Example
///
/// ```
/// use test_utils::WireBuilder;
///
/// let bytes = WireBuilder::little_endian().i32(3).f64(1.0).build();
/// assert_eq!(bytes.len(), 12);
/// assert_eq!(&bytes[..4], &[3, 0, 0, 0]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WireBuilder {
    bytes: Vec<u8>,
    little_endian: bool,
}

macro_rules! wire_numbers {
    ($($name:ident: $ty:ty),*) => {
        $(
            pub fn $name(mut self, value: $ty) -> Self {
                if self.little_endian {
                    self.bytes.extend_from_slice(&value.to_le_bytes());
                } else {
                    self.bytes.extend_from_slice(&value.to_be_bytes());
                }
                self
            }
        )*
    };
}

impl WireBuilder {
    pub fn little_endian() -> Self {
        Self {
            bytes: Vec::new(),
            little_endian: true,
        }
    }

    pub fn big_endian() -> Self {
        Self::default()
    }

    wire_numbers!(i8: i8, u8: u8, i16: i16, u16: u16, i32: i32, u32: u32, i64: i64, f32: f32, f64: f64);

    /// UTF-8 string preceded by its unsigned 16-bit length.
    pub fn string(self, value: &str) -> Self {
        let mut builder = self.u16(value.len() as u16);
        builder.bytes.extend_from_slice(value.as_bytes());
        builder
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    /// The stream as standard base64 text.
    pub fn build_base64(self) -> String {
        STANDARD.encode(self.bytes)
    }
}

/// A `count_and_values` record in little-endian layout:
/// 4-byte count followed by one 8-byte double per value.
pub fn count_values_record_le(values: &[f64]) -> Vec<u8> {
    values
        .iter()
        .fold(WireBuilder::little_endian().i32(values.len() as i32), |b, v| {
            b.f64(*v)
        })
        .build()
}

/// Join rows of tokens into delimited text.
pub fn delimited_records(rows: &[&[&str]], token_separator: &str, block_separator: &str) -> String {
    rows.iter()
        .map(|row| format!("{}{}", row.join(token_separator), block_separator))
        .collect()
}
