//! Array components: one element schema repeated a fixed or variable number
//! of times.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::data::{DataBlock, ListBlock};
use crate::error::{DataError, DataResult};

use super::{ComponentKind, DataComponent, SiblingScope};

/// How the number of elements of an array is determined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementCount {
    /// Always exactly this many elements.
    Fixed(usize),
    /// Size written in the stream right before the elements.
    Inline,
    /// Size held by a preceding count field of an enclosing record.
    Sibling(String),
}

impl ElementCount {
    pub fn is_fixed(&self) -> bool {
        matches!(self, ElementCount::Fixed(_))
    }
}

/// An array of `size` elements sharing one element schema.
///
/// Fixed-size arrays of scalars are stored as one contiguous scalar block;
/// all other arrays hold a list block with one entry per element.
#[derive(Debug)]
pub struct DataArray {
    pub(crate) element: Box<DataComponent>,
    pub(crate) element_count: ElementCount,
    pub(crate) size: usize,
}

impl DataArray {
    pub(crate) fn new(element: DataComponent, element_count: ElementCount) -> Self {
        let size = match element_count {
            ElementCount::Fixed(n) => n,
            _ => 0,
        };
        Self {
            element: Box::new(element),
            element_count,
            size,
        }
    }

    pub fn element(&self) -> &DataComponent {
        &self.element
    }

    pub fn element_count(&self) -> &ElementCount {
        &self.element_count
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_variable_size(&self) -> bool {
        !self.element_count.is_fixed()
    }

    fn is_contiguous(&self) -> bool {
        self.element_count.is_fixed() && self.element.is_scalar()
    }

    /// Size this array should have given the current sibling values.
    ///
    /// Inline counts are only known to the stream reader, so they keep the
    /// current size.
    pub fn resolve_size(&self, scope: &SiblingScope<'_>) -> DataResult<usize> {
        match &self.element_count {
            ElementCount::Fixed(n) => Ok(*n),
            ElementCount::Inline => Ok(self.size),
            ElementCount::Sibling(name) => scope.count_of(name),
        }
    }

    pub(crate) fn create_block(&self) -> DataResult<DataBlock> {
        if self.is_contiguous() {
            if let Some(data_type) = self.element.data_type() {
                return Ok(DataBlock::new_scalar(data_type, self.size));
            }
        }
        let mut list = ListBlock::with_capacity(self.size);
        for _ in 0..self.size {
            list.add(self.element.create_data_block()?);
        }
        Ok(list.into())
    }

    pub(crate) fn assign(&mut self, name: &str, block: &DataBlock) -> DataResult<()> {
        if self.is_contiguous() {
            if !block.is_scalar() || block.atom_count() != self.size {
                return Err(DataError::block_mismatch(
                    format!("scalar block of {} atoms for array '{}'", self.size, name),
                    format!("{} block of {} atoms", block.kind_name(), block.atom_count()),
                ));
            }
            if self.size == 0 {
                self.element.clear_data();
                return Ok(());
            }
            return self.element.assign(block.window(0, 1)?);
        }

        let list = block.as_list()?;
        if let ElementCount::Fixed(n) = self.element_count {
            if list.size() != n {
                return Err(DataError::block_mismatch(
                    format!("{} elements for array '{}'", n, name),
                    format!("{} elements", list.size()),
                ));
            }
        }
        self.size = list.size();
        if list.is_empty() {
            self.element.clear_data();
            Ok(())
        } else {
            self.element.assign(list.get(0).alias())
        }
    }

    /// Bind the element schema to element `index` of `block`.
    pub(crate) fn bind_element(&mut self, block: &DataBlock, index: usize) -> DataResult<()> {
        if self.is_contiguous() {
            self.element.assign(block.window(index, 1)?)
        } else {
            self.element.assign(block.as_list()?.get(index).alias())
        }
    }

    /// Store the element schema's block back into slot `index`.
    ///
    /// Scalar elements share storage with their slot and need no write-back.
    pub(crate) fn commit_element(&self, block: &mut DataBlock, index: usize) {
        if self.element.is_scalar() {
            return;
        }
        if let (DataBlock::List(list), Some(element)) = (block, &self.element.data) {
            list.replace(index, element.alias());
        }
    }
}

impl DataComponent {
    fn array_parts(&self) -> DataResult<&DataArray> {
        match &self.kind {
            ComponentKind::Array(array) => Ok(array),
            _ => Err(DataError::NotAnArray(self.name.clone())),
        }
    }

    /// Element schema of an array.
    pub fn element_type(&self) -> DataResult<&DataComponent> {
        Ok(&self.array_parts()?.element)
    }

    /// Current number of elements of an array.
    pub fn array_size(&self) -> DataResult<usize> {
        Ok(self.array_parts()?.size)
    }

    pub fn element_count(&self) -> DataResult<&ElementCount> {
        Ok(&self.array_parts()?.element_count)
    }

    /// A block viewing element `index` of a bound array.
    pub fn element_block(&self, index: usize) -> DataResult<DataBlock> {
        let array = self.array_parts()?;
        if index >= array.size {
            return Err(DataError::structure(format!(
                "element {} out of range for array '{}' of size {}",
                index, self.name, array.size
            )));
        }
        let block = self.data()?;
        if array.is_contiguous() {
            block.window(index, 1)
        } else {
            Ok(block.as_list()?.get(index).alias())
        }
    }

    /// Change the number of elements of an array.
    ///
    /// Fixed-size arrays only accept their declared size. For variable
    /// arrays the bound block keeps existing elements, drops trailing ones
    /// or appends freshly created ones. Enclosing components are not
    /// touched; use the path operations to propagate the change.
    pub fn resize_array(&mut self, new_size: usize) -> DataResult<()> {
        let DataComponent {
            name, kind, data, ..
        } = self;
        let ComponentKind::Array(array) = kind else {
            return Err(DataError::NotAnArray(name.clone()));
        };

        if let ElementCount::Fixed(n) = array.element_count {
            if new_size != n {
                return Err(DataError::structure(format!(
                    "array '{}' has a fixed size of {}, cannot resize to {}",
                    name, n, new_size
                )));
            }
            return Ok(());
        }

        if let Some(block) = data.as_mut() {
            let list = block.as_list_mut()?;
            if new_size < list.size() {
                list.truncate(new_size);
            } else {
                for _ in list.size()..new_size {
                    list.add(array.element.create_data_block()?);
                }
            }
            if new_size == 0 {
                array.element.clear_data();
            } else if !array.element.has_data() {
                array.element.assign(list.get(0).alias())?;
            }
        }

        trace!(array = %name, from = array.size, to = new_size, "resized array");
        array.size = new_size;
        Ok(())
    }

    /// Append one element to a variable array, returning its index.
    pub fn add_element(&mut self) -> DataResult<usize> {
        let index = self.array_size()?;
        self.resize_array(index + 1)?;
        Ok(index)
    }

    /// Visit every element of a bound array in order.
    ///
    /// The element schema is bound to each element in turn. Structural
    /// changes made by `f` are written back into the array's block.
    pub fn for_each_element_mut<E, F>(
        &mut self,
        scope: &SiblingScope<'_>,
        mut f: F,
    ) -> Result<(), E>
    where
        E: From<DataError>,
        F: FnMut(usize, &mut DataComponent, &SiblingScope<'_>) -> Result<(), E>,
    {
        let DataComponent {
            name, kind, data, ..
        } = self;
        let ComponentKind::Array(array) = kind else {
            return Err(DataError::NotAnArray(name.clone()).into());
        };
        let block = data
            .as_mut()
            .ok_or_else(|| DataError::Unbound(name.clone()))?;

        for i in 0..array.size {
            array.bind_element(block, i)?;
            f(i, array.element.as_mut(), scope)?;
            array.commit_element(block, i);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_fixed_scalar_array_is_contiguous() {
        let mut array = DataComponent::array(
            "values",
            DataComponent::quantity("v", "m"),
            ElementCount::Fixed(3),
        );
        array.assign_new_data_block().unwrap();
        let block = array.data().unwrap();
        assert_eq!(block.data_type(), Some(crate::value::DataType::Double));
        assert_eq!(block.atom_count(), 3);
    }

    #[test]
    fn test_fixed_array_rejects_other_sizes() {
        let mut array =
            DataComponent::array("values", DataComponent::count("v"), ElementCount::Fixed(2));
        array.assign_new_data_block().unwrap();
        assert!(array.resize_array(2).is_ok());
        assert!(matches!(array.resize_array(3), Err(DataError::Structure(_))));
    }

    #[test]
    fn test_growing_keeps_existing_elements() {
        let mut array =
            DataComponent::array("values", DataComponent::quantity("v", "m"), ElementCount::Inline);
        array.assign_new_data_block().unwrap();
        array.resize_array(2).unwrap();
        array.data().unwrap().set_double(1, 4.5).unwrap();

        array.resize_array(4).unwrap();
        let block = array.data().unwrap();
        assert_eq!(block.atom_count(), 4);
        assert_eq!(block.get_double(1).unwrap(), 4.5);
        assert_eq!(block.get_double(3).unwrap(), 0.0);

        array.resize_array(1).unwrap();
        assert_eq!(array.data().unwrap().atom_count(), 1);
    }

    #[test]
    fn test_element_type_of_non_array_fails() {
        let scalar = DataComponent::count("n");
        assert!(matches!(scalar.element_type(), Err(DataError::NotAnArray(_))));
    }

    #[test]
    fn test_for_each_element_binds_each_slot() {
        let mut array =
            DataComponent::array("values", DataComponent::count("v"), ElementCount::Fixed(3));
        array.assign_new_data_block().unwrap();
        array
            .for_each_element_mut::<DataError, _>(&SiblingScope::root(), |i, element, _| {
                element.set_value(&Value::Int(i as i32 * 10))
            })
            .unwrap();
        let values: Vec<_> = array.data().unwrap().values();
        assert_eq!(values, vec![Value::Int(0), Value::Int(10), Value::Int(20)]);
    }
}
