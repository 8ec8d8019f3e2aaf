//! Flat, typed, windowed primitive storage.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::DataResult;
use crate::value::{Atom, Value};

/// A window `[start_index, start_index + atom_count)` over a shared
/// primitive array.
///
/// Several blocks may view the same underlying array. [`ScalarBlock::alias`]
/// and [`ScalarBlock::window`] share it, so a `set` through one view is
/// visible through all others; [`ScalarBlock::deep_copy`] and
/// [`ScalarBlock::renew`] allocate a new array.
///
/// Indexing past `atom_count` is a programming error and panics.
pub struct ScalarBlock<T: Atom> {
    primitives: Rc<RefCell<Vec<T>>>,
    start_index: usize,
    atom_count: usize,
}

impl<T: Atom> ScalarBlock<T> {
    /// Create a block of `size` default values.
    pub fn new(size: usize) -> Self {
        Self::from_vec(vec![T::default(); size])
    }

    /// Create a block viewing all of `values`.
    pub fn from_vec(values: Vec<T>) -> Self {
        let atom_count = values.len();
        Self {
            primitives: Rc::new(RefCell::new(values)),
            start_index: 0,
            atom_count,
        }
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn atom_count(&self) -> usize {
        self.atom_count
    }

    /// Replace the underlying array with `size` fresh default values.
    ///
    /// Other aliases keep the previous array.
    pub fn resize(&mut self, size: usize) {
        self.primitives = Rc::new(RefCell::new(vec![T::default(); size]));
        self.start_index = 0;
        self.atom_count = size;
    }

    pub fn get(&self, index: usize) -> T {
        let pos = self.position(index);
        self.primitives.borrow()[pos].clone()
    }

    pub fn set(&self, index: usize, value: T) {
        let pos = self.position(index);
        self.primitives.borrow_mut()[pos] = value;
    }

    pub fn value(&self, index: usize) -> Value {
        let pos = self.position(index);
        self.primitives.borrow()[pos].to_value()
    }

    /// Store `value` at `index`, coercing it to this block's kind.
    pub fn set_value(&self, index: usize, value: &Value) -> DataResult<()> {
        let converted = T::from_value(value)?;
        self.set(index, converted);
        Ok(())
    }

    /// Shallow copy: a new view over the same underlying array.
    pub fn alias(&self) -> Self {
        Self {
            primitives: Rc::clone(&self.primitives),
            start_index: self.start_index,
            atom_count: self.atom_count,
        }
    }

    /// A view over `count` atoms starting at `offset` within this window.
    pub fn window(&self, offset: usize, count: usize) -> Self {
        assert!(
            offset + count <= self.atom_count,
            "window {}..{} exceeds block of {} atoms",
            offset,
            offset + count,
            self.atom_count
        );
        Self {
            primitives: Rc::clone(&self.primitives),
            start_index: self.start_index + offset,
            atom_count: count,
        }
    }

    /// Deep copy of the visible range into an independent array.
    pub fn deep_copy(&self) -> Self {
        let values = self.to_vec();
        Self::from_vec(values)
    }

    /// Same shape, freshly allocated default storage.
    pub fn renew(&self) -> Self {
        Self::new(self.atom_count)
    }

    /// Visible values, in order.
    pub fn to_vec(&self) -> Vec<T> {
        let primitives = self.primitives.borrow();
        primitives[self.start_index..self.start_index + self.atom_count].to_vec()
    }

    /// Length of the underlying array, which may exceed the visible window.
    pub fn underlying_len(&self) -> usize {
        self.primitives.borrow().len()
    }

    /// Whether both blocks view the same underlying array.
    pub fn shares_storage(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.primitives, &other.primitives)
    }

    fn position(&self, index: usize) -> usize {
        assert!(
            index < self.atom_count,
            "index {} out of range for block of {} atoms",
            index,
            self.atom_count
        );
        self.start_index + index
    }
}

impl<T: Atom> fmt::Debug for ScalarBlock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarBlock")
            .field("type", &T::DATA_TYPE)
            .field("start_index", &self.start_index)
            .field("values", &self.to_vec())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_block_is_zeroed() {
        let block = ScalarBlock::<f64>::new(4);
        assert_eq!(block.atom_count(), 4);
        assert_eq!(block.to_vec(), vec![0.0; 4]);
    }

    #[test]
    fn test_window_shares_storage() {
        let block = ScalarBlock::from_vec(vec![1, 2, 3, 4, 5]);
        let window = block.window(1, 3);
        assert_eq!(window.start_index(), 1);
        assert_eq!(window.to_vec(), vec![2, 3, 4]);

        window.set(0, 20);
        assert_eq!(block.get(1), 20);
        assert!(window.shares_storage(&block));
    }

    #[test]
    fn test_deep_copy_only_copies_window() {
        let block = ScalarBlock::from_vec(vec![1i64, 2, 3, 4]);
        let copy = block.window(2, 2).deep_copy();
        assert_eq!(copy.underlying_len(), 2);
        assert_eq!(copy.to_vec(), vec![3, 4]);
    }

    #[test]
    fn test_resize_detaches_from_aliases() {
        let mut block = ScalarBlock::from_vec(vec![true, true]);
        let alias = block.alias();
        block.resize(3);
        assert_eq!(block.to_vec(), vec![false; 3]);
        assert_eq!(alias.to_vec(), vec![true, true]);
        assert!(!alias.shares_storage(&block));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_index_past_window_panics() {
        let block = ScalarBlock::<i32>::new(3);
        let window = block.window(0, 2);
        window.get(2);
    }
}
