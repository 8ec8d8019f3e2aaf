//! Data blocks: the runtime containers holding SWE Common values.
//!
//! A [`DataBlock`] is either a typed [`ScalarBlock`] window over a flat
//! primitive array, a [`MixedBlock`] concatenating heterogeneous children
//! (records, choices), or a [`ListBlock`] of homogeneous elements
//! (variable-size arrays, data streams).
//!
//! Every block reads and writes every scalar kind through the coercion
//! rules in [`crate::value`].

mod composite;
mod scalar;

pub use composite::{ListBlock, MixedBlock};
pub use scalar::ScalarBlock;

use chrono::{DateTime, FixedOffset, Utc};

use crate::error::{DataError, DataResult};
use crate::value::{DataType, Value};

/// A block of values of any shape.
#[derive(Debug)]
pub enum DataBlock {
    Boolean(ScalarBlock<bool>),
    Byte(ScalarBlock<i8>),
    Short(ScalarBlock<i16>),
    Int(ScalarBlock<i32>),
    Long(ScalarBlock<i64>),
    Float(ScalarBlock<f32>),
    Double(ScalarBlock<f64>),
    Text(ScalarBlock<String>),
    Instant(ScalarBlock<DateTime<Utc>>),
    DateTime(ScalarBlock<DateTime<FixedOffset>>),
    Mixed(MixedBlock),
    List(ListBlock),
}

/// Apply the same expression to whichever scalar block variant is present.
macro_rules! on_scalar {
    ($block:expr, $b:ident => $scalar:expr, $($rest:pat => $other:expr),+ $(,)?) => {
        match $block {
            DataBlock::Boolean($b) => $scalar,
            DataBlock::Byte($b) => $scalar,
            DataBlock::Short($b) => $scalar,
            DataBlock::Int($b) => $scalar,
            DataBlock::Long($b) => $scalar,
            DataBlock::Float($b) => $scalar,
            DataBlock::Double($b) => $scalar,
            DataBlock::Text($b) => $scalar,
            DataBlock::Instant($b) => $scalar,
            DataBlock::DateTime($b) => $scalar,
            $($rest => $other,)+
        }
    };
}

/// Same as `on_scalar!` but rebuilds a block of the same variant.
macro_rules! map_scalar {
    ($block:expr, $b:ident => $scalar:expr, $m:ident => $mixed:expr, $l:ident => $list:expr) => {
        match $block {
            DataBlock::Boolean($b) => DataBlock::Boolean($scalar),
            DataBlock::Byte($b) => DataBlock::Byte($scalar),
            DataBlock::Short($b) => DataBlock::Short($scalar),
            DataBlock::Int($b) => DataBlock::Int($scalar),
            DataBlock::Long($b) => DataBlock::Long($scalar),
            DataBlock::Float($b) => DataBlock::Float($scalar),
            DataBlock::Double($b) => DataBlock::Double($scalar),
            DataBlock::Text($b) => DataBlock::Text($scalar),
            DataBlock::Instant($b) => DataBlock::Instant($scalar),
            DataBlock::DateTime($b) => DataBlock::DateTime($scalar),
            DataBlock::Mixed($m) => DataBlock::Mixed($mixed),
            DataBlock::List($l) => DataBlock::List($list),
        }
    };
}

/// Typed get/set pairs that go through value coercion.
macro_rules! typed_accessors {
    ($($get:ident, $set:ident, $ty:ty, $as:ident, $variant:ident;)*) => {
        $(
            pub fn $get(&self, index: usize) -> DataResult<$ty> {
                self.value(index).$as()
            }

            pub fn $set(&self, index: usize, value: $ty) -> DataResult<()> {
                self.set_value(index, &Value::$variant(value))
            }
        )*
    };
}

impl DataBlock {
    /// Create a scalar block of `size` default atoms.
    pub fn new_scalar(data_type: DataType, size: usize) -> DataBlock {
        match data_type {
            DataType::Boolean => DataBlock::Boolean(ScalarBlock::new(size)),
            DataType::Byte => DataBlock::Byte(ScalarBlock::new(size)),
            DataType::Short => DataBlock::Short(ScalarBlock::new(size)),
            DataType::Int => DataBlock::Int(ScalarBlock::new(size)),
            DataType::Long => DataBlock::Long(ScalarBlock::new(size)),
            DataType::Float => DataBlock::Float(ScalarBlock::new(size)),
            DataType::Double => DataBlock::Double(ScalarBlock::new(size)),
            DataType::Utf8String => DataBlock::Text(ScalarBlock::new(size)),
            DataType::Instant => DataBlock::Instant(ScalarBlock::new(size)),
            DataType::DateTime => DataBlock::DateTime(ScalarBlock::new(size)),
        }
    }

    /// Primitive kind for scalar blocks, `None` for composites.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            DataBlock::Boolean(_) => Some(DataType::Boolean),
            DataBlock::Byte(_) => Some(DataType::Byte),
            DataBlock::Short(_) => Some(DataType::Short),
            DataBlock::Int(_) => Some(DataType::Int),
            DataBlock::Long(_) => Some(DataType::Long),
            DataBlock::Float(_) => Some(DataType::Float),
            DataBlock::Double(_) => Some(DataType::Double),
            DataBlock::Text(_) => Some(DataType::Utf8String),
            DataBlock::Instant(_) => Some(DataType::Instant),
            DataBlock::DateTime(_) => Some(DataType::DateTime),
            DataBlock::Mixed(_) | DataBlock::List(_) => None,
        }
    }

    /// Short name of the block shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DataBlock::Mixed(_) => "mixed",
            DataBlock::List(_) => "list",
            scalar => scalar.data_type().map(|t| t.as_str()).unwrap_or("unknown"),
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.data_type().is_some()
    }

    pub fn atom_count(&self) -> usize {
        on_scalar!(self, b => b.atom_count(),
            DataBlock::Mixed(m) => m.atom_count(),
            DataBlock::List(l) => l.atom_count())
    }

    /// Offset of the visible window in the underlying array (0 for composites).
    pub fn start_index(&self) -> usize {
        on_scalar!(self, b => b.start_index(), DataBlock::Mixed(_) | DataBlock::List(_) => 0)
    }

    /// Read atom `index` in its stored kind.
    pub fn value(&self, index: usize) -> Value {
        on_scalar!(self, b => b.value(index),
            DataBlock::Mixed(m) => m.value(index),
            DataBlock::List(l) => l.value(index))
    }

    /// Write atom `index`, coercing to the stored kind.
    pub fn set_value(&self, index: usize, value: &Value) -> DataResult<()> {
        on_scalar!(self, b => b.set_value(index, value),
            DataBlock::Mixed(m) => m.set_value(index, value),
            DataBlock::List(l) => l.set_value(index, value))
    }

    typed_accessors! {
        get_boolean, set_boolean, bool, as_boolean, Boolean;
        get_byte, set_byte, i8, as_byte, Byte;
        get_short, set_short, i16, as_short, Short;
        get_int, set_int, i32, as_int, Int;
        get_long, set_long, i64, as_long, Long;
        get_float, set_float, f32, as_float, Float;
        get_double, set_double, f64, as_double, Double;
        get_instant, set_instant, DateTime<Utc>, as_instant, Instant;
        get_date_time, set_date_time, DateTime<FixedOffset>, as_date_time, DateTime;
    }

    pub fn get_string(&self, index: usize) -> String {
        self.value(index).as_text()
    }

    pub fn set_string(&self, index: usize, value: impl Into<String>) -> DataResult<()> {
        self.set_value(index, &Value::Text(value.into()))
    }

    /// Every atom in order, flattened through composites.
    pub fn values(&self) -> Vec<Value> {
        (0..self.atom_count()).map(|i| self.value(i)).collect()
    }

    /// Shallow copy sharing all underlying arrays.
    pub fn alias(&self) -> DataBlock {
        map_scalar!(self, b => b.alias(), m => m.alias(), l => l.alias())
    }

    /// Deep copy of the visible values into independent arrays.
    pub fn deep_copy(&self) -> DataBlock {
        map_scalar!(self, b => b.deep_copy(), m => m.deep_copy(), l => l.deep_copy())
    }

    /// Same layout with freshly allocated default storage.
    pub fn renew(&self) -> DataBlock {
        map_scalar!(self, b => b.renew(), m => m.renew(), l => l.renew())
    }

    /// Reallocate a scalar block to `size` atoms.
    pub fn resize(&mut self, size: usize) -> DataResult<()> {
        let kind = self.kind_name();
        on_scalar!(self, b => {
                b.resize(size);
                Ok(())
            },
            DataBlock::Mixed(_) | DataBlock::List(_) => {
                Err(DataError::block_mismatch("scalar block", kind))
            })
    }

    /// A sub-window of a scalar block sharing its storage.
    pub fn window(&self, offset: usize, count: usize) -> DataResult<DataBlock> {
        Ok(match self {
            DataBlock::Boolean(b) => DataBlock::Boolean(b.window(offset, count)),
            DataBlock::Byte(b) => DataBlock::Byte(b.window(offset, count)),
            DataBlock::Short(b) => DataBlock::Short(b.window(offset, count)),
            DataBlock::Int(b) => DataBlock::Int(b.window(offset, count)),
            DataBlock::Long(b) => DataBlock::Long(b.window(offset, count)),
            DataBlock::Float(b) => DataBlock::Float(b.window(offset, count)),
            DataBlock::Double(b) => DataBlock::Double(b.window(offset, count)),
            DataBlock::Text(b) => DataBlock::Text(b.window(offset, count)),
            DataBlock::Instant(b) => DataBlock::Instant(b.window(offset, count)),
            DataBlock::DateTime(b) => DataBlock::DateTime(b.window(offset, count)),
            DataBlock::Mixed(_) | DataBlock::List(_) => {
                return Err(DataError::block_mismatch("scalar block", self.kind_name()))
            }
        })
    }

    /// Whether two scalar blocks view the same underlying array.
    pub fn shares_storage(&self, other: &DataBlock) -> bool {
        match (self, other) {
            (DataBlock::Boolean(a), DataBlock::Boolean(b)) => a.shares_storage(b),
            (DataBlock::Byte(a), DataBlock::Byte(b)) => a.shares_storage(b),
            (DataBlock::Short(a), DataBlock::Short(b)) => a.shares_storage(b),
            (DataBlock::Int(a), DataBlock::Int(b)) => a.shares_storage(b),
            (DataBlock::Long(a), DataBlock::Long(b)) => a.shares_storage(b),
            (DataBlock::Float(a), DataBlock::Float(b)) => a.shares_storage(b),
            (DataBlock::Double(a), DataBlock::Double(b)) => a.shares_storage(b),
            (DataBlock::Text(a), DataBlock::Text(b)) => a.shares_storage(b),
            (DataBlock::Instant(a), DataBlock::Instant(b)) => a.shares_storage(b),
            (DataBlock::DateTime(a), DataBlock::DateTime(b)) => a.shares_storage(b),
            _ => false,
        }
    }

    pub fn as_mixed(&self) -> DataResult<&MixedBlock> {
        match self {
            DataBlock::Mixed(m) => Ok(m),
            other => Err(DataError::block_mismatch("mixed", other.kind_name())),
        }
    }

    pub fn as_mixed_mut(&mut self) -> DataResult<&mut MixedBlock> {
        match self {
            DataBlock::Mixed(m) => Ok(m),
            other => Err(DataError::block_mismatch("mixed", other.kind_name())),
        }
    }

    pub fn as_list(&self) -> DataResult<&ListBlock> {
        match self {
            DataBlock::List(l) => Ok(l),
            other => Err(DataError::block_mismatch("list", other.kind_name())),
        }
    }

    pub fn as_list_mut(&mut self) -> DataResult<&mut ListBlock> {
        match self {
            DataBlock::List(l) => Ok(l),
            other => Err(DataError::block_mismatch("list", other.kind_name())),
        }
    }
}

impl From<MixedBlock> for DataBlock {
    fn from(block: MixedBlock) -> Self {
        DataBlock::Mixed(block)
    }
}

impl From<ListBlock> for DataBlock {
    fn from(block: ListBlock) -> Self {
        DataBlock::List(block)
    }
}
