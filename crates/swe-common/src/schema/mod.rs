//! Component schema tree and block assembly.
//!
//! A [`DataComponent`] describes the logical structure of a value (scalar,
//! record, array or choice) and may be bound to a [`DataBlock`] holding its
//! current value. Binding a composite block splits it so every descendant
//! component views its own slice of the same storage.
//!
//! Structural changes (resizing a variable array, switching a choice item)
//! reallocate the affected component's block. Ancestors pick the change up
//! bottom-up as the path operations in [`path`] unwind, so the parent's
//! atom count always equals the sum of its children's.

mod array;
mod choice;
pub mod definition;
mod path;
mod record;
mod scalar;
mod scope;

pub use array::{DataArray, ElementCount};
pub use choice::DataChoice;
pub use definition::{ComponentDef, KindDef};
pub use record::DataRecord;
pub use scalar::{ScalarComponent, ScalarKind};
pub use scope::SiblingScope;

use crate::data::{DataBlock, MixedBlock};
use crate::error::{DataError, DataResult};
use crate::value::{DataType, Value};

/// Structural variant of a component.
#[derive(Debug)]
pub enum ComponentKind {
    Scalar(ScalarComponent),
    Record(DataRecord),
    Array(DataArray),
    Choice(DataChoice),
}

/// A node of the schema tree, optionally bound to a data block.
#[derive(Debug)]
pub struct DataComponent {
    pub(crate) name: String,
    pub(crate) label: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) definition: Option<String>,
    pub(crate) optional: bool,
    pub(crate) kind: ComponentKind,
    pub(crate) data: Option<DataBlock>,
}

impl DataComponent {
    fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
            definition: None,
            optional: false,
            kind,
            data: None,
        }
    }

    // ===== Construction =====

    pub fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(name, ComponentKind::Scalar(ScalarComponent::new(kind)))
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarKind::Boolean)
    }

    pub fn count(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarKind::Count)
    }

    pub fn quantity(name: impl Into<String>, uom: &str) -> Self {
        Self::scalar(
            name,
            ScalarKind::Quantity {
                uom: Some(uom.to_string()),
            },
        )
    }

    pub fn time(name: impl Into<String>) -> Self {
        Self::scalar(
            name,
            ScalarKind::Time {
                uom: Some("http://www.opengis.net/def/uom/ISO-8601/0/Gregorian".to_string()),
            },
        )
    }

    pub fn category(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarKind::Category { code_space: None })
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarKind::Text)
    }

    pub fn record(name: impl Into<String>, fields: Vec<DataComponent>) -> Self {
        Self::new(name, ComponentKind::Record(DataRecord { fields }))
    }

    pub fn array(name: impl Into<String>, element: DataComponent, count: ElementCount) -> Self {
        Self::new(name, ComponentKind::Array(DataArray::new(element, count)))
    }

    pub fn choice(name: impl Into<String>, items: Vec<DataComponent>) -> Self {
        Self::new(
            name,
            ComponentKind::Choice(DataChoice {
                items,
                selected: None,
            }),
        )
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Override the storage kind of a scalar. Ignored for composites.
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        if let ComponentKind::Scalar(scalar) = &mut self.kind {
            scalar.data_type = data_type;
        }
        self
    }

    // ===== Schema inspection =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ComponentKind::Scalar(_) => "scalar",
            ComponentKind::Record(_) => "record",
            ComponentKind::Array(_) => "array",
            ComponentKind::Choice(_) => "choice",
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, ComponentKind::Scalar(_))
    }

    pub fn is_record(&self) -> bool {
        matches!(self.kind, ComponentKind::Record(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ComponentKind::Array(_))
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.kind, ComponentKind::Choice(_))
    }

    /// Storage kind of a scalar component.
    pub fn data_type(&self) -> Option<DataType> {
        match &self.kind {
            ComponentKind::Scalar(scalar) => Some(scalar.data_type),
            _ => None,
        }
    }

    pub fn scalar_kind(&self) -> Option<&ScalarKind> {
        match &self.kind {
            ComponentKind::Scalar(scalar) => Some(&scalar.kind),
            _ => None,
        }
    }

    /// Direct children: record fields, choice items, or the array element.
    pub fn children(&self) -> &[DataComponent] {
        match &self.kind {
            ComponentKind::Scalar(_) => &[],
            ComponentKind::Record(record) => &record.fields,
            ComponentKind::Array(array) => std::slice::from_ref(array.element.as_ref()),
            ComponentKind::Choice(choice) => &choice.items,
        }
    }

    pub fn component_count(&self) -> usize {
        self.children().len()
    }

    pub fn child(&self, index: usize) -> Option<&DataComponent> {
        self.children().get(index)
    }

    pub fn child_index(&self, name: &str) -> Option<usize> {
        self.children().iter().position(|c| c.name == name)
    }

    pub fn child_by_name(&self, name: &str) -> Option<&DataComponent> {
        self.children().iter().find(|c| c.name == name)
    }

    /// Copy of the schema structure without any bound data.
    pub fn copy_structure(&self) -> DataComponent {
        let kind = match &self.kind {
            ComponentKind::Scalar(scalar) => ComponentKind::Scalar(scalar.clone()),
            ComponentKind::Record(record) => ComponentKind::Record(DataRecord {
                fields: record.fields.iter().map(|c| c.copy_structure()).collect(),
            }),
            ComponentKind::Array(array) => ComponentKind::Array(DataArray {
                element: Box::new(array.element.copy_structure()),
                element_count: array.element_count.clone(),
                size: array.size,
            }),
            ComponentKind::Choice(choice) => ComponentKind::Choice(DataChoice {
                items: choice.items.iter().map(|c| c.copy_structure()).collect(),
                selected: choice.selected,
            }),
        };
        Self {
            name: self.name.clone(),
            label: self.label.clone(),
            description: self.description.clone(),
            definition: self.definition.clone(),
            optional: self.optional,
            kind,
            data: None,
        }
    }

    // ===== Data binding =====

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// The currently bound block.
    pub fn data(&self) -> DataResult<&DataBlock> {
        self.data
            .as_ref()
            .ok_or_else(|| DataError::Unbound(self.name.clone()))
    }

    /// Alias of the currently bound block.
    pub fn data_alias(&self) -> DataResult<DataBlock> {
        self.data().map(DataBlock::alias)
    }

    /// Unbind this component and all descendants.
    pub fn clear_data(&mut self) {
        self.data = None;
        match &mut self.kind {
            ComponentKind::Scalar(_) => {}
            ComponentKind::Record(record) => record.fields.iter_mut().for_each(|c| c.clear_data()),
            ComponentKind::Array(array) => array.element.clear_data(),
            ComponentKind::Choice(choice) => choice.items.iter_mut().for_each(|c| c.clear_data()),
        }
    }

    /// Number of atoms of the current value.
    ///
    /// Uses the bound block when there is one, otherwise the schema's
    /// current shape.
    pub fn atom_count(&self) -> usize {
        if let Some(block) = &self.data {
            return block.atom_count();
        }
        match &self.kind {
            ComponentKind::Scalar(_) => 1,
            ComponentKind::Record(record) => record.fields.iter().map(|c| c.atom_count()).sum(),
            ComponentKind::Array(array) => array.size * array.element.atom_count(),
            ComponentKind::Choice(choice) => {
                1 + choice
                    .selected
                    .map(|i| choice.items[i].atom_count())
                    .unwrap_or(0)
            }
        }
    }

    /// Build a new block matching the schema's current shape.
    ///
    /// Variable arrays get their current size and choices their current
    /// selection. Nothing is bound.
    pub fn create_data_block(&self) -> DataResult<DataBlock> {
        match &self.kind {
            ComponentKind::Scalar(scalar) => Ok(DataBlock::new_scalar(scalar.data_type, 1)),
            ComponentKind::Record(record) => record.create_block(),
            ComponentKind::Array(array) => array.create_block(),
            ComponentKind::Choice(choice) => choice.create_block(),
        }
    }

    /// Bind `block` to this component, splitting it across descendants.
    pub fn assign(&mut self, block: DataBlock) -> DataResult<()> {
        match &mut self.kind {
            ComponentKind::Scalar(_) => {
                if !block.is_scalar() || block.atom_count() == 0 {
                    return Err(DataError::block_mismatch(
                        format!("scalar block for '{}'", self.name),
                        block.kind_name(),
                    ));
                }
            }
            ComponentKind::Record(record) => record.assign(&self.name, &block)?,
            ComponentKind::Array(array) => array.assign(&self.name, &block)?,
            ComponentKind::Choice(choice) => choice.assign(&self.name, &block)?,
        }
        self.data = Some(block);
        Ok(())
    }

    /// Create a block for the current shape and bind it.
    pub fn assign_new_data_block(&mut self) -> DataResult<()> {
        let block = self.create_data_block()?;
        self.assign(block)
    }

    /// Value of a bound scalar component.
    pub fn value(&self) -> DataResult<Value> {
        self.require_scalar()?;
        Ok(self.data()?.value(0))
    }

    /// Set the value of a bound scalar component.
    pub fn set_value(&self, value: &Value) -> DataResult<()> {
        self.require_scalar()?;
        self.data()?.set_value(0, value)
    }

    fn require_scalar(&self) -> DataResult<()> {
        if self.is_scalar() {
            Ok(())
        } else {
            Err(DataError::structure(format!(
                "'{}' is a {}, not a scalar",
                self.name,
                self.kind_name()
            )))
        }
    }

    /// Re-read child `index`'s block into this component's composite block.
    ///
    /// Called after a structural change below `index`; updates this
    /// component's atom count.
    pub(crate) fn sync_child(&mut self, index: usize) {
        let Some(DataBlock::Mixed(mixed)) = self.data.as_mut() else {
            return;
        };
        match &self.kind {
            ComponentKind::Record(record) => {
                if let Some(block) = &record.fields[index].data {
                    mixed.set_block(index, block.alias());
                }
            }
            ComponentKind::Choice(choice) => {
                if let Some(block) = &choice.items[index].data {
                    set_choice_item_block(mixed, block.alias());
                }
            }
            ComponentKind::Scalar(_) | ComponentKind::Array(_) => {}
        }
    }
}

/// Put `block` in the item slot of a choice's mixed block.
pub(crate) fn set_choice_item_block(mixed: &mut MixedBlock, block: DataBlock) {
    if mixed.block_count() > 1 {
        mixed.set_block(1, block);
    } else {
        mixed.push(block);
    }
}
