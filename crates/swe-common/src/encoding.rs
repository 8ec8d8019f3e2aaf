//! Encoding descriptors: how a component's values are laid out on the wire.

use serde::{Deserialize, Serialize};

use crate::error::{DataError, DataResult};
use crate::value::DataType;

const OGC_DATA_TYPE: &str = "http://www.opengis.net/def/dataType/OGC/0/";

/// Wire format selection for a data stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataEncoding {
    Binary(BinaryEncoding),
    Text(TextEncoding),
    Json(JsonEncoding),
}

impl DataEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            DataEncoding::Binary(_) => "binary",
            DataEncoding::Text(_) => "text",
            DataEncoding::Json(_) => "json",
        }
    }

    pub fn from_json(json: &str) -> DataResult<Self> {
        let encoding: Self = serde_json::from_str(json)?;
        encoding.validate()?;
        Ok(encoding)
    }

    pub fn validate(&self) -> DataResult<()> {
        match self {
            DataEncoding::Binary(binary) => binary.validate(),
            DataEncoding::Text(text) => text.validate(),
            DataEncoding::Json(_) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteEncoding {
    #[default]
    Raw,
    Base64,
}

/// Wire representation of one scalar in a binary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryDataType {
    Boolean,
    SignedByte,
    UnsignedByte,
    SignedShort,
    UnsignedShort,
    SignedInt,
    UnsignedInt,
    SignedLong,
    UnsignedLong,
    Float32,
    Float64,
    /// UTF-8 bytes preceded by an unsigned 16-bit length.
    Utf8String,
}

impl BinaryDataType {
    /// Size in bytes, or `None` for variable length strings.
    pub fn byte_width(&self) -> Option<usize> {
        match self {
            BinaryDataType::Boolean | BinaryDataType::SignedByte | BinaryDataType::UnsignedByte => {
                Some(1)
            }
            BinaryDataType::SignedShort | BinaryDataType::UnsignedShort => Some(2),
            BinaryDataType::SignedInt | BinaryDataType::UnsignedInt | BinaryDataType::Float32 => {
                Some(4)
            }
            BinaryDataType::SignedLong
            | BinaryDataType::UnsignedLong
            | BinaryDataType::Float64 => Some(8),
            BinaryDataType::Utf8String => None,
        }
    }

    /// Wire type used for a scalar stored as `data_type` when the encoding
    /// has no member entry for it. Times are written as epoch seconds.
    pub fn default_for(data_type: DataType) -> Self {
        match data_type {
            DataType::Boolean => BinaryDataType::Boolean,
            DataType::Byte => BinaryDataType::SignedByte,
            DataType::Short => BinaryDataType::SignedShort,
            DataType::Int => BinaryDataType::SignedInt,
            DataType::Long => BinaryDataType::SignedLong,
            DataType::Float => BinaryDataType::Float32,
            DataType::Double | DataType::Instant | DataType::DateTime => BinaryDataType::Float64,
            DataType::Utf8String => BinaryDataType::Utf8String,
        }
    }

    fn uri_suffix(&self) -> &'static str {
        match self {
            BinaryDataType::Boolean => "boolean",
            BinaryDataType::SignedByte => "signedByte",
            BinaryDataType::UnsignedByte => "unsignedByte",
            BinaryDataType::SignedShort => "signedShort",
            BinaryDataType::UnsignedShort => "unsignedShort",
            BinaryDataType::SignedInt => "signedInt",
            BinaryDataType::UnsignedInt => "unsignedInt",
            BinaryDataType::SignedLong => "signedLong",
            BinaryDataType::UnsignedLong => "unsignedLong",
            BinaryDataType::Float32 => "float32",
            BinaryDataType::Float64 => "float64",
            BinaryDataType::Utf8String => "string-utf-8",
        }
    }

    /// OGC data type definition URI.
    pub fn uri(&self) -> String {
        format!("{}{}", OGC_DATA_TYPE, self.uri_suffix())
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        let suffix = uri.strip_prefix(OGC_DATA_TYPE).unwrap_or(uri);
        let all = [
            BinaryDataType::Boolean,
            BinaryDataType::SignedByte,
            BinaryDataType::UnsignedByte,
            BinaryDataType::SignedShort,
            BinaryDataType::UnsignedShort,
            BinaryDataType::SignedInt,
            BinaryDataType::UnsignedInt,
            BinaryDataType::SignedLong,
            BinaryDataType::UnsignedLong,
            BinaryDataType::Float32,
            BinaryDataType::Float64,
            BinaryDataType::Utf8String,
        ];
        all.into_iter().find(|t| t.uri_suffix() == suffix)
    }
}

/// Binary layout of the scalar at `reference`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryMember {
    /// `/`-separated path from the root component, through array elements.
    pub reference: String,
    pub data_type: BinaryDataType,
    /// Overrides the encoding's byte order for this member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_order: Option<ByteOrder>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryEncoding {
    pub byte_order: ByteOrder,
    pub byte_encoding: ByteEncoding,
    /// Stream length in bytes after base64 decoding. Readers stop there and
    /// ignore anything that follows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_length: Option<u64>,
    pub members: Vec<BinaryMember>,
}

impl BinaryEncoding {
    pub fn new(byte_order: ByteOrder) -> Self {
        Self {
            byte_order,
            ..Default::default()
        }
    }

    /// Add a member entry.
    pub fn with_member(mut self, reference: &str, data_type: BinaryDataType) -> Self {
        self.members.push(BinaryMember {
            reference: reference.trim_matches('/').to_string(),
            data_type,
            byte_order: None,
        });
        self
    }

    pub fn with_byte_encoding(mut self, byte_encoding: ByteEncoding) -> Self {
        self.byte_encoding = byte_encoding;
        self
    }

    pub fn member(&self, reference: &str) -> Option<&BinaryMember> {
        let reference = reference.trim_matches('/');
        self.members
            .iter()
            .find(|m| m.reference.trim_matches('/') == reference)
    }

    pub fn validate(&self) -> DataResult<()> {
        for (i, member) in self.members.iter().enumerate() {
            if member.reference.trim_matches('/').is_empty() {
                return Err(DataError::InvalidDefinition(format!(
                    "binary member {} has an empty reference",
                    i
                )));
            }
            if self.members[..i]
                .iter()
                .any(|m| m.reference.trim_matches('/') == member.reference.trim_matches('/'))
            {
                return Err(DataError::InvalidDefinition(format!(
                    "binary member '{}' is declared twice",
                    member.reference
                )));
            }
        }
        Ok(())
    }
}

/// Delimited text layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextEncoding {
    pub token_separator: String,
    pub block_separator: String,
    pub decimal_separator: char,
    pub collapse_white_space: bool,
    /// Digits after the decimal separator when writing floating point values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<usize>,
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self {
            token_separator: ",".to_string(),
            block_separator: "\n".to_string(),
            decimal_separator: '.',
            collapse_white_space: true,
            decimal_places: None,
        }
    }
}

impl TextEncoding {
    pub fn new(token_separator: &str, block_separator: &str) -> Self {
        Self {
            token_separator: token_separator.to_string(),
            block_separator: block_separator.to_string(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> DataResult<()> {
        if self.token_separator.is_empty() || self.block_separator.is_empty() {
            return Err(DataError::InvalidDefinition(
                "text separators must not be empty".to_string(),
            ));
        }
        if self.token_separator == self.block_separator {
            return Err(DataError::InvalidDefinition(
                "token and block separators must differ".to_string(),
            ));
        }
        if self.token_separator.contains(self.decimal_separator)
            || self.block_separator.contains(self.decimal_separator)
        {
            return Err(DataError::InvalidDefinition(format!(
                "decimal separator '{}' clashes with a token or block separator",
                self.decimal_separator
            )));
        }
        Ok(())
    }
}

/// JSON record layout: one JSON value per record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonEncoding {
    pub pretty: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_from_json() {
        let json = r#"{
            "type": "binary",
            "byte_order": "little_endian",
            "members": [
                { "reference": "count", "data_type": "signed_int" },
                { "reference": "values/value", "data_type": "float64", "byte_order": "big_endian" }
            ]
        }"#;
        let DataEncoding::Binary(binary) = DataEncoding::from_json(json).unwrap() else {
            panic!("expected binary encoding");
        };
        assert_eq!(binary.byte_order, ByteOrder::LittleEndian);
        assert_eq!(binary.byte_encoding, ByteEncoding::Raw);
        let member = binary.member("/values/value").unwrap();
        assert_eq!(member.byte_order, Some(ByteOrder::BigEndian));
    }

    #[test]
    fn test_text_defaults() {
        let encoding = DataEncoding::from_json(r#"{ "type": "text" }"#).unwrap();
        assert_eq!(encoding, DataEncoding::Text(TextEncoding::default()));
    }

    #[test]
    fn test_text_rejects_clashing_separators() {
        let mut text = TextEncoding::new(",", "\n");
        text.decimal_separator = ',';
        assert!(text.validate().is_err());
        assert!(TextEncoding::new(" ", " ").validate().is_err());
    }

    #[test]
    fn test_binary_type_uris() {
        let uri = BinaryDataType::SignedInt.uri();
        assert_eq!(uri, "http://www.opengis.net/def/dataType/OGC/0/signedInt");
        assert_eq!(BinaryDataType::from_uri(&uri), Some(BinaryDataType::SignedInt));
        assert_eq!(BinaryDataType::from_uri("float64"), Some(BinaryDataType::Float64));
        assert_eq!(BinaryDataType::Utf8String.byte_width(), None);
    }
}
