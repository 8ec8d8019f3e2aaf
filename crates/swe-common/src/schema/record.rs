//! Record components: named, ordered, heterogeneous fields.

use crate::data::{DataBlock, MixedBlock};
use crate::error::{DataError, DataResult};
use crate::value::Value;

use super::{ComponentKind, DataComponent, ElementCount, SiblingScope};

/// Ordered list of named fields, stored as one mixed block.
#[derive(Debug)]
pub struct DataRecord {
    pub(crate) fields: Vec<DataComponent>,
}

impl DataRecord {
    pub fn fields(&self) -> &[DataComponent] {
        &self.fields
    }

    pub(crate) fn create_block(&self) -> DataResult<DataBlock> {
        let blocks = self
            .fields
            .iter()
            .map(DataComponent::create_data_block)
            .collect::<DataResult<Vec<_>>>()?;

        // Keep count fields consistent with the arrays they size.
        for field in &self.fields {
            if let ComponentKind::Array(array) = &field.kind {
                if let ElementCount::Sibling(count_name) = &array.element_count {
                    if let Some(j) = self.fields.iter().position(|f| &f.name == count_name) {
                        blocks[j].set_value(0, &Value::Long(array.size as i64))?;
                    }
                }
            }
        }

        Ok(MixedBlock::new(blocks).into())
    }

    pub(crate) fn assign(&mut self, name: &str, block: &DataBlock) -> DataResult<()> {
        let mixed = block.as_mixed()?;
        if mixed.block_count() != self.fields.len() {
            return Err(DataError::block_mismatch(
                format!("{} field blocks for record '{}'", self.fields.len(), name),
                format!("{} blocks", mixed.block_count()),
            ));
        }
        for (field, child) in self.fields.iter_mut().zip(mixed.blocks()) {
            field.assign(child.alias())?;
        }
        Ok(())
    }
}

impl DataComponent {
    /// Visit every field of a record in order.
    ///
    /// Each field sees the fields before it (and those of enclosing records
    /// through `parent`) as its sibling scope. Composite fields are re-synced
    /// into this record's block after the visit, so structural changes made
    /// by `f` propagate upwards.
    pub fn for_each_field_mut<E, F>(
        &mut self,
        parent: Option<&SiblingScope<'_>>,
        mut f: F,
    ) -> Result<(), E>
    where
        E: From<DataError>,
        F: FnMut(&mut DataComponent, &SiblingScope<'_>) -> Result<(), E>,
    {
        let DataComponent {
            name, kind, data, ..
        } = self;
        let ComponentKind::Record(record) = kind else {
            return Err(DataError::structure(format!("'{}' is not a record", name)).into());
        };

        for i in 0..record.fields.len() {
            let (before, rest) = record.fields.split_at_mut(i);
            let field = &mut rest[0];
            let scope = SiblingScope::new(before, parent);
            f(field, &scope)?;

            if !field.is_scalar() {
                if let (Some(DataBlock::Mixed(mixed)), Some(block)) = (data.as_mut(), &field.data) {
                    mixed.set_block(i, block.alias());
                }
            }
        }
        Ok(())
    }
}
