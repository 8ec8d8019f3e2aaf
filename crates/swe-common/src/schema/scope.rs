//! Lookup of sibling components by name, from the nearest record outwards.

use crate::error::{DataError, DataResult};

use super::DataComponent;

/// Components preceding the one being visited, chained through every
/// enclosing record.
///
/// Array sizes declared as [`super::ElementCount::Sibling`] resolve against
/// this chain, so a count field must appear before the array it sizes.
#[derive(Debug, Clone, Copy)]
pub struct SiblingScope<'a> {
    siblings: &'a [DataComponent],
    parent: Option<&'a SiblingScope<'a>>,
}

impl<'a> SiblingScope<'a> {
    pub fn new(siblings: &'a [DataComponent], parent: Option<&'a SiblingScope<'a>>) -> Self {
        Self { siblings, parent }
    }

    /// An empty scope, used at the root of a walk.
    pub fn root() -> Self {
        Self {
            siblings: &[],
            parent: None,
        }
    }

    /// Nearest component called `name`.
    pub fn lookup(&self, name: &str) -> Option<&'a DataComponent> {
        self.siblings
            .iter()
            .rev()
            .find(|c| c.name == name)
            .or_else(|| self.parent.and_then(|p| p.lookup(name)))
    }

    /// Current value of the count field `name`, as an array size.
    pub fn count_of(&self, name: &str) -> DataResult<usize> {
        let component = self.lookup(name).ok_or_else(|| {
            DataError::structure(format!("array size field '{}' not found", name))
        })?;
        let count = component.value()?.as_long()?;
        usize::try_from(count).map_err(|_| {
            DataError::structure(format!("array size field '{}' is negative ({})", name, count))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_lookup_prefers_nearest_scope() {
        let mut outer = vec![DataComponent::count("n")];
        outer[0].assign_new_data_block().unwrap();
        outer[0].set_value(&Value::Int(4)).unwrap();
        let mut inner = vec![DataComponent::count("n")];
        inner[0].assign_new_data_block().unwrap();
        inner[0].set_value(&Value::Int(2)).unwrap();

        let outer_scope = SiblingScope::new(&outer, None);
        let inner_scope = SiblingScope::new(&inner, Some(&outer_scope));
        assert_eq!(inner_scope.count_of("n").unwrap(), 2);
        assert_eq!(outer_scope.count_of("n").unwrap(), 4);
        assert!(inner_scope.lookup("missing").is_none());
    }

    #[test]
    fn test_negative_count_is_structural_error() {
        let mut fields = vec![DataComponent::count("n")];
        fields[0].assign_new_data_block().unwrap();
        fields[0].set_value(&Value::Int(-1)).unwrap();
        let scope = SiblingScope::new(&fields, None);
        assert!(matches!(scope.count_of("n"), Err(DataError::Structure(_))));
    }
}
