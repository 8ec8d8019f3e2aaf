//! Addressing components by `/`-separated name paths.
//!
//! Paths start below the component they are resolved from, so `"a/b"` on a
//! record names field `b` of its field `a`. Mutating walks re-sync every
//! component they pass on the way back up, which is how array resizes and
//! choice switches reach the root's block.
//!
//! In mutating walks a numeric step after an array picks one element, so
//! `"levels/1/samples"` is the `samples` array of the second level. The
//! element is written back into the array's block before unwinding.

use tracing::debug;

use crate::error::{DataError, DataResult};
use crate::value::Value;

use super::{ComponentKind, DataComponent, ElementCount, SiblingScope};

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

type Visit<'f, R> = dyn for<'s> FnMut(&mut DataComponent, &SiblingScope<'s>) -> DataResult<R> + 'f;

fn walk_mut<R>(
    component: &mut DataComponent,
    steps: &[&str],
    full_path: &str,
    scope: &SiblingScope<'_>,
    visit: &mut Visit<'_, R>,
) -> DataResult<R> {
    let Some((step, rest)) = steps.split_first() else {
        return visit(component, scope);
    };

    if let ComponentKind::Array(array) = &mut component.kind {
        let index = match step.parse::<usize>() {
            Ok(index) if index < array.size => index,
            Ok(index) => {
                return Err(DataError::structure(format!(
                    "element {} out of range for array '{}' of size {}",
                    index, component.name, array.size
                )));
            }
            Err(_) => {
                return Err(DataError::structure(format!(
                    "path '{}' crosses array '{}'; address elements by index",
                    full_path, component.name
                )));
            }
        };
        let block = component
            .data
            .as_mut()
            .ok_or_else(|| DataError::Unbound(component.name.clone()))?;
        array.bind_element(block, index)?;
        let result = walk_mut(array.element.as_mut(), rest, full_path, scope, visit);
        array.commit_element(block, index);
        return result;
    }

    let index = component
        .child_index(step)
        .ok_or_else(|| DataError::PathNotFound(full_path.to_string()))?;

    let result = match &mut component.kind {
        ComponentKind::Record(record) => {
            let (before, after) = record.fields.split_at_mut(index);
            let inner = SiblingScope::new(before, Some(scope));
            walk_mut(&mut after[0], rest, full_path, &inner, visit)?
        }
        ComponentKind::Choice(choice) => {
            if choice.selected != Some(index) {
                return Err(DataError::structure(format!(
                    "item '{}' of choice '{}' is not selected",
                    step, component.name
                )));
            }
            walk_mut(&mut choice.items[index], rest, full_path, scope, visit)?
        }
        ComponentKind::Scalar(_) | ComponentKind::Array(_) => {
            return Err(DataError::PathNotFound(full_path.to_string()));
        }
    };

    component.sync_child(index);
    Ok(result)
}

impl DataComponent {
    /// Component at `path`, descending into array element schemas by name.
    pub fn find(&self, path: &str) -> Option<&DataComponent> {
        split_path(path)
            .into_iter()
            .try_fold(self, |component, step| component.child_by_name(step))
    }

    /// Value of the bound scalar at `path`.
    pub fn value_at(&self, path: &str) -> DataResult<Value> {
        self.find(path)
            .ok_or_else(|| DataError::PathNotFound(path.to_string()))?
            .value()
    }

    /// Set the bound scalar at `path`.
    pub fn set_value_at(&self, path: &str, value: &Value) -> DataResult<()> {
        self.find(path)
            .ok_or_else(|| DataError::PathNotFound(path.to_string()))?
            .set_value(value)
    }

    /// Run `visit` on the component at `path`, then propagate any
    /// structural change it made to every enclosing component.
    ///
    /// The path may pass through records, the selected item of choices and
    /// array elements addressed by index.
    pub fn with_component_mut<R>(
        &mut self,
        path: &str,
        mut visit: impl FnMut(&mut DataComponent, &SiblingScope<'_>) -> DataResult<R>,
    ) -> DataResult<R> {
        let steps = split_path(path);
        walk_mut(self, &steps, path, &SiblingScope::root(), &mut visit)
    }

    /// Resize the array at `path` from its size field and return the new size.
    ///
    /// This is the operation to call after changing the value of the count
    /// field a variable array refers to.
    pub fn update_array_size(&mut self, path: &str) -> DataResult<usize> {
        self.with_component_mut(path, |array, scope| {
            let size = match &array.kind {
                ComponentKind::Array(parts) => parts.resolve_size(scope)?,
                _ => return Err(DataError::NotAnArray(array.name.clone())),
            };
            array.resize_array(size)?;
            Ok(size)
        })
    }

    /// Resize the array at `path` to `size` elements.
    ///
    /// When the array is sized by a sibling count field, that field is set
    /// to the new size as well.
    pub fn resize_array_at(&mut self, path: &str, size: usize) -> DataResult<()> {
        self.with_component_mut(path, |array, scope| {
            array.resize_array(size)?;
            set_sibling_count(array, scope, size)
        })
    }

    /// Append one element to the variable array at `path`.
    ///
    /// Returns the index of the new element.
    pub fn add_element_at(&mut self, path: &str) -> DataResult<usize> {
        self.with_component_mut(path, |array, scope| {
            let index = array.add_element()?;
            set_sibling_count(array, scope, index + 1)?;
            Ok(index)
        })
    }

    /// Select item `index` of the choice at `path`.
    pub fn select_item_at(&mut self, path: &str, index: usize) -> DataResult<()> {
        self.with_component_mut(path, |choice, _| choice.select_item(index))
    }

    /// Select the item named `item` of the choice at `path`.
    pub fn select_item_by_name_at(&mut self, path: &str, item: &str) -> DataResult<()> {
        self.with_component_mut(path, |choice, _| choice.select_item_by_name(item))
    }
}

fn set_sibling_count(array: &DataComponent, scope: &SiblingScope<'_>, size: usize) -> DataResult<()> {
    if let Ok(ElementCount::Sibling(name)) = array.element_count() {
        if let Some(count) = scope.lookup(name).filter(|c| c.has_data()) {
            debug!(array = %array.name, count = %name, size, "updated array size field");
            count.set_value(&Value::Long(size as i64))?;
        }
    }
    Ok(())
}
