//! Path-resolving accessor over a schema-bound data block.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use swe_common::{Atom, DataBlock, DataComponent, DataError, SiblingScope, Value};
use tracing::{debug, trace};

use crate::error::{AccessorError, AccessorResult};
use crate::naming;

/// The bound component tree shared by an accessor and its element views.
#[derive(Debug)]
struct SharedRoot {
    component: DataComponent,
    pending: Option<DataBlock>,
}

impl SharedRoot {
    fn bind(&mut self) -> AccessorResult<&mut DataComponent> {
        if let Some(block) = self.pending.take() {
            self.component.assign(block)?;
        }
        if !self.component.has_data() {
            return Err(AccessorError::Unbound);
        }
        Ok(&mut self.component)
    }
}

/// Named access to the values of one data block.
///
/// Each method name used with the accessor is mapped to a component path,
/// either explicitly with [`bind`](Self::bind) or implicitly by matching the
/// name against the root's children (see [`naming`](crate::naming)). The
/// mapping is resolved on first use and then cached; it depends only on the
/// component structure, so [`wrap`](Self::wrap) never invalidates it.
///
/// Accessors returned by [`element`](Self::element) and [`add`](Self::add)
/// are views of one array element of the same tree. Every operation, on the
/// root or on a view, walks the shared tree from its root, so resizing an
/// array inside an element updates the element's size field, the enclosing
/// array and the root block together.
#[derive(Debug)]
pub struct DataAccessor {
    schema: DataComponent,
    root: Rc<RefCell<SharedRoot>>,
    prefix: String,
    paths: HashMap<String, String>,
}

/// Typed views built on top of a [`DataAccessor`].
///
/// Implemented by the structs that [`data_accessor!`](crate::data_accessor)
/// generates, and by `DataAccessor` itself.
pub trait AccessorView: Sized {
    fn from_accessor(accessor: DataAccessor) -> Self;

    fn accessor(&self) -> &DataAccessor;

    fn accessor_mut(&mut self) -> &mut DataAccessor;
}

impl AccessorView for DataAccessor {
    fn from_accessor(accessor: DataAccessor) -> Self {
        accessor
    }

    fn accessor(&self) -> &DataAccessor {
        self
    }

    fn accessor_mut(&mut self) -> &mut DataAccessor {
        self
    }
}

impl DataAccessor {
    /// Create an accessor over a copy of `component`'s structure.
    pub fn new(component: &DataComponent) -> Self {
        Self {
            schema: component.copy_structure(),
            root: Self::shared(component, None),
            prefix: String::new(),
            paths: HashMap::new(),
        }
    }

    fn shared(component: &DataComponent, pending: Option<DataBlock>) -> Rc<RefCell<SharedRoot>> {
        Rc::new(RefCell::new(SharedRoot {
            component: component.copy_structure(),
            pending,
        }))
    }

    /// Map `method` to an explicit component path.
    ///
    /// The path is not checked until the method is first used.
    pub fn bind(&mut self, method: &str, path: &str) -> &mut Self {
        self.paths.insert(method.to_string(), path.to_string());
        self
    }

    pub fn with_binding(mut self, method: &str, path: &str) -> Self {
        self.bind(method, path);
        self
    }

    /// Point the accessor at another data block.
    ///
    /// The block is bound lazily on the next access. An element view that
    /// is rewrapped detaches from its parent and owns the new block.
    pub fn wrap(&mut self, block: DataBlock) {
        trace!(atoms = block.atom_count(), "Wrapped data block");
        self.root = Self::shared(&self.schema, Some(block));
        self.prefix.clear();
    }

    pub fn component(&self) -> &DataComponent {
        &self.schema
    }

    /// Path of this view below the root of the shared tree.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Alias of the block currently behind the accessor.
    pub fn data(&mut self) -> AccessorResult<DataBlock> {
        self.visit("", |c, _| c.data_alias())
    }

    /// Path a method resolves to, without touching any data.
    pub fn path_of(&mut self, method: &str) -> AccessorResult<String> {
        if let Some(path) = self.paths.get(method) {
            return Ok(path.clone());
        }
        let path = naming::implicit_path(&self.schema, method)
            .ok_or_else(|| AccessorError::Unresolved(method.to_string()))?;
        debug!(method, path = %path, "Resolved accessor method");
        self.paths.insert(method.to_string(), path.clone());
        Ok(path)
    }

    pub fn get_value(&mut self, method: &str) -> AccessorResult<Value> {
        let path = self.target(method, "a scalar", DataComponent::is_scalar)?;
        self.visit(&path, |c, _| c.value())
    }

    pub fn get<T: Atom>(&mut self, method: &str) -> AccessorResult<T> {
        let value = self.get_value(method)?;
        Ok(T::from_value(&value)?)
    }

    pub fn set_value(&mut self, method: &str, value: &Value) -> AccessorResult<()> {
        let path = self.target(method, "a scalar", DataComponent::is_scalar)?;
        self.visit(&path, |c, _| c.set_value(value))
    }

    pub fn set<T: Atom>(&mut self, method: &str, value: T) -> AccessorResult<()> {
        self.set_value(method, &value.to_value())
    }

    /// Current size of an array.
    pub fn count(&mut self, method: &str) -> AccessorResult<usize> {
        let path = self.target(method, "an array", DataComponent::is_array)?;
        self.visit(&path, |c, _| c.array_size())
    }

    /// Resize a variable array, updating its size field and every ancestor.
    pub fn set_num(&mut self, method: &str, size: usize) -> AccessorResult<()> {
        let path = self.target(method, "an array", DataComponent::is_array)?;
        let full = self.full_path(&path);
        self.with_root(|root| root.resize_array_at(&full, size))
    }

    /// View of element `index` of an array.
    ///
    /// The view shares the tree of this accessor.
    pub fn element(&mut self, method: &str, index: usize) -> AccessorResult<DataAccessor> {
        let path = self.target(method, "an array", DataComponent::is_array)?;
        self.visit(&path, |array, _| array.element_block(index).map(|_| ()))?;
        let element = self
            .schema
            .find(&path)
            .ok_or_else(|| DataError::PathNotFound(path.clone()))?
            .element_type()?;
        Ok(DataAccessor {
            schema: element.copy_structure(),
            root: Rc::clone(&self.root),
            prefix: format!("{}/{}", self.full_path(&path), index),
            paths: HashMap::new(),
        })
    }

    /// Append an element to a variable array and return a view of it.
    pub fn add(&mut self, method: &str) -> AccessorResult<DataAccessor> {
        let path = self.target(method, "a variable size array", |c| {
            c.element_count().map(|count| !count.is_fixed()).unwrap_or(false)
        })?;
        let full = self.full_path(&path);
        let index = self.with_root(|root| root.add_element_at(&full))?;
        debug!(method, path = %full, index, "Added array element");
        self.element(method, index)
    }

    /// Select a choice item by name.
    pub fn select(&mut self, method: &str, item: &str) -> AccessorResult<()> {
        let path = self.target(method, "a choice", DataComponent::is_choice)?;
        let full = self.full_path(&path);
        self.with_root(|root| root.select_item_by_name_at(&full, item))
    }

    /// Name of the selected item of a choice.
    pub fn selected(&mut self, method: &str) -> AccessorResult<String> {
        let path = self.target(method, "a choice", DataComponent::is_choice)?;
        self.visit(&path, |choice, _| {
            choice.selected_item().map(|item| item.name().to_string())
        })
    }

    /// Resolve `method` and check the kind of component it names.
    fn target(
        &mut self,
        method: &str,
        expected: &'static str,
        accepts: impl Fn(&DataComponent) -> bool,
    ) -> AccessorResult<String> {
        let path = self.path_of(method)?;
        let component = self
            .schema
            .find(&path)
            .ok_or_else(|| DataError::PathNotFound(path.clone()))?;
        if !accepts(component) {
            return Err(AccessorError::incompatible(
                method,
                &path,
                expected,
                component.kind_name(),
            ));
        }
        Ok(path)
    }

    fn full_path(&self, path: &str) -> String {
        match (self.prefix.is_empty(), path.is_empty()) {
            (true, _) => path.to_string(),
            (false, true) => self.prefix.clone(),
            (false, false) => format!("{}/{}", self.prefix, path),
        }
    }

    fn with_root<R>(
        &self,
        f: impl FnOnce(&mut DataComponent) -> Result<R, DataError>,
    ) -> AccessorResult<R> {
        let mut shared = self.root.borrow_mut();
        let root = shared.bind()?;
        Ok(f(root)?)
    }

    /// Run `f` on the component at `path` below this view.
    fn visit<R>(
        &self,
        path: &str,
        mut f: impl FnMut(&mut DataComponent, &SiblingScope<'_>) -> Result<R, DataError>,
    ) -> AccessorResult<R> {
        let full = self.full_path(path);
        self.with_root(|root| root.with_component_mut(&full, &mut f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swe_common::ElementCount;

    fn point() -> DataComponent {
        DataComponent::record(
            "point",
            vec![
                DataComponent::quantity("x", "m"),
                DataComponent::quantity("y", "m"),
                DataComponent::array(
                    "tags",
                    DataComponent::text("tag"),
                    ElementCount::Inline,
                ),
            ],
        )
    }

    #[test]
    fn test_unbound_accessor() {
        let mut accessor = DataAccessor::new(&point());
        assert!(matches!(accessor.get::<f64>("get_x"), Err(AccessorError::Unbound)));
    }

    #[test]
    fn test_wrong_kind_is_reported_on_use() {
        let mut accessor = DataAccessor::new(&point()).with_binding("get_tag", "tags");
        accessor.wrap(point().create_data_block().unwrap());
        let err = accessor.get::<String>("get_tag").unwrap_err();
        assert!(matches!(
            err,
            AccessorError::IncompatibleKind { found: "array", .. }
        ));
    }

    #[test]
    fn test_paths_are_cached() {
        let mut accessor = DataAccessor::new(&point());
        assert_eq!(accessor.path_of("set_y").unwrap(), "y");
        assert_eq!(accessor.paths.len(), 1);
        assert!(matches!(
            accessor.path_of("get_z"),
            Err(AccessorError::Unresolved(_))
        ));
    }
}
