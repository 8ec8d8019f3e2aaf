//! Scalar leaf components.

use serde::{Deserialize, Serialize};

use crate::value::DataType;

/// Semantic flavour of a scalar component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScalarKind {
    Boolean,
    /// Integer count; the only kind usable as an array size field.
    Count,
    Quantity {
        #[serde(default)]
        uom: Option<String>,
    },
    Time {
        #[serde(default)]
        uom: Option<String>,
    },
    Category {
        #[serde(default)]
        code_space: Option<String>,
    },
    Text,
}

impl ScalarKind {
    /// Storage kind used when none is given explicitly.
    pub fn default_data_type(&self) -> DataType {
        match self {
            ScalarKind::Boolean => DataType::Boolean,
            ScalarKind::Count => DataType::Int,
            ScalarKind::Quantity { .. } => DataType::Double,
            ScalarKind::Time { .. } => DataType::Instant,
            ScalarKind::Category { .. } | ScalarKind::Text => DataType::Utf8String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Boolean => "Boolean",
            ScalarKind::Count => "Count",
            ScalarKind::Quantity { .. } => "Quantity",
            ScalarKind::Time { .. } => "Time",
            ScalarKind::Category { .. } => "Category",
            ScalarKind::Text => "Text",
        }
    }

    /// Unit of measure for quantities and times.
    pub fn uom(&self) -> Option<&str> {
        match self {
            ScalarKind::Quantity { uom } | ScalarKind::Time { uom } => uom.as_deref(),
            _ => None,
        }
    }
}

/// A scalar leaf: one atom of a given storage kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarComponent {
    pub(crate) kind: ScalarKind,
    pub(crate) data_type: DataType,
}

impl ScalarComponent {
    pub fn new(kind: ScalarKind) -> Self {
        let data_type = kind.default_data_type();
        Self { kind, data_type }
    }

    pub fn kind(&self) -> &ScalarKind {
        &self.kind
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}
