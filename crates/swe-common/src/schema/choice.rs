//! Choice components: a tagged union over named items.

use crate::data::{DataBlock, MixedBlock};
use crate::error::{DataError, DataResult};
use crate::value::{DataType, Value};

use super::{set_choice_item_block, ComponentKind, DataComponent};

/// Selector value stored when no item is selected.
const NO_SELECTION: i32 = -1;

/// A union of named items, exactly one of which carries a value.
///
/// The bound block is a mixed block holding an int selector followed by the
/// selected item's block, so its atom count is one more than the item's.
#[derive(Debug)]
pub struct DataChoice {
    pub(crate) items: Vec<DataComponent>,
    pub(crate) selected: Option<usize>,
}

impl DataChoice {
    pub fn items(&self) -> &[DataComponent] {
        &self.items
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub(crate) fn create_block(&self) -> DataResult<DataBlock> {
        let selector = DataBlock::new_scalar(DataType::Int, 1);
        let mut blocks = vec![selector];
        match self.selected {
            Some(index) => {
                blocks[0].set_int(0, index as i32)?;
                blocks.push(self.items[index].create_data_block()?);
            }
            None => blocks[0].set_int(0, NO_SELECTION)?,
        }
        Ok(MixedBlock::new(blocks).into())
    }

    pub(crate) fn assign(&mut self, name: &str, block: &DataBlock) -> DataResult<()> {
        let mixed = block.as_mixed()?;
        if mixed.block_count() == 0 {
            return Err(DataError::block_mismatch(
                format!("selector block for choice '{}'", name),
                "empty mixed block",
            ));
        }
        let selector = mixed.block(0).get_int(0)?;
        for item in &mut self.items {
            item.clear_data();
        }

        if selector < 0 {
            self.selected = None;
            return Ok(());
        }
        let index = selector as usize;
        if index >= self.items.len() {
            return Err(DataError::InvalidChoiceItem {
                name: name.to_string(),
                index: selector as i64,
                count: self.items.len(),
            });
        }
        if mixed.block_count() != 2 {
            return Err(DataError::block_mismatch(
                format!("selector and item blocks for choice '{}'", name),
                format!("{} blocks", mixed.block_count()),
            ));
        }
        self.items[index].assign(mixed.block(1).alias())?;
        self.selected = Some(index);
        Ok(())
    }
}

impl DataComponent {
    fn choice_parts(&self) -> DataResult<&DataChoice> {
        match &self.kind {
            ComponentKind::Choice(choice) => Ok(choice),
            _ => Err(DataError::structure(format!("'{}' is not a choice", self.name))),
        }
    }

    /// Index of the selected item, if any.
    pub fn selected_index(&self) -> DataResult<Option<usize>> {
        Ok(self.choice_parts()?.selected)
    }

    /// The selected item of a choice.
    pub fn selected_item(&self) -> DataResult<&DataComponent> {
        let choice = self.choice_parts()?;
        choice
            .selected
            .map(|i| &choice.items[i])
            .ok_or_else(|| DataError::NoChoiceSelected(self.name.clone()))
    }

    /// Mutable access to the selected item.
    ///
    /// Changes to the item's structure are only seen by this choice's block
    /// after [`DataComponent::sync_selected_item`].
    pub fn selected_item_mut(&mut self) -> DataResult<&mut DataComponent> {
        let name = self.name.clone();
        match &mut self.kind {
            ComponentKind::Choice(DataChoice {
                items,
                selected: Some(index),
            }) => Ok(&mut items[*index]),
            ComponentKind::Choice(_) => Err(DataError::NoChoiceSelected(name)),
            _ => Err(DataError::structure(format!("'{}' is not a choice", name))),
        }
    }

    /// Copy the selected item's block into this choice's block.
    pub fn sync_selected_item(&mut self) {
        if let Ok(Some(index)) = self.selected_index() {
            self.sync_child(index);
        }
    }

    /// Select item `index`.
    ///
    /// The previous item's value is discarded. When the choice is bound, a
    /// new block is created for the item and the selector is updated.
    pub fn select_item(&mut self, index: usize) -> DataResult<()> {
        let DataComponent {
            name, kind, data, ..
        } = self;
        let ComponentKind::Choice(choice) = kind else {
            return Err(DataError::structure(format!("'{}' is not a choice", name)));
        };
        if index >= choice.items.len() {
            return Err(DataError::InvalidChoiceItem {
                name: name.clone(),
                index: index as i64,
                count: choice.items.len(),
            });
        }

        if let Some(previous) = choice.selected {
            choice.items[previous].clear_data();
        }
        choice.selected = Some(index);

        if let Some(block) = data.as_mut() {
            let mixed = block.as_mixed_mut()?;
            mixed.block(0).set_value(0, &Value::Int(index as i32))?;
            let item = &mut choice.items[index];
            item.assign_new_data_block()?;
            set_choice_item_block(mixed, item.data_alias()?);
        }
        Ok(())
    }

    /// Select the item called `item_name`.
    pub fn select_item_by_name(&mut self, item_name: &str) -> DataResult<()> {
        let index = self
            .choice_parts()?
            .items
            .iter()
            .position(|item| item.name == item_name)
            .ok_or_else(|| {
                DataError::structure(format!(
                    "choice '{}' has no item named '{}'",
                    self.name, item_name
                ))
            })?;
        self.select_item(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ElementCount;

    fn sample_choice() -> DataComponent {
        DataComponent::choice(
            "reading",
            vec![
                DataComponent::quantity("temperature", "Cel"),
                DataComponent::array(
                    "spectrum",
                    DataComponent::quantity("band", "W"),
                    ElementCount::Fixed(4),
                ),
            ],
        )
    }

    #[test]
    fn test_unselected_choice_reports_error() {
        let choice = sample_choice();
        assert!(matches!(
            choice.selected_item(),
            Err(DataError::NoChoiceSelected(_))
        ));
    }

    #[test]
    fn test_switching_items_discards_previous_value() {
        let mut choice = sample_choice();
        choice.assign_new_data_block().unwrap();
        assert_eq!(choice.atom_count(), 1);

        choice.select_item(0).unwrap();
        choice.selected_item().unwrap().set_value(&Value::Double(21.5)).unwrap();
        assert_eq!(choice.atom_count(), 2);

        choice.select_item(1).unwrap();
        assert_eq!(choice.atom_count(), 1 + 4);
        assert!(!choice.child(0).unwrap().has_data());
        assert_eq!(choice.data().unwrap().get_int(0).unwrap(), 1);
    }

    #[test]
    fn test_assign_validates_selector() {
        let mut choice = sample_choice();
        let selector = DataBlock::new_scalar(DataType::Int, 1);
        selector.set_int(0, 7).unwrap();
        let block: DataBlock = MixedBlock::new(vec![selector]).into();
        assert!(matches!(
            choice.assign(block),
            Err(DataError::InvalidChoiceItem { index: 7, .. })
        ));
    }

    #[test]
    fn test_select_by_name() {
        let mut choice = sample_choice();
        choice.select_item_by_name("spectrum").unwrap();
        assert_eq!(choice.selected_index().unwrap(), Some(1));
        assert!(choice.select_item_by_name("pressure").is_err());
    }
}
