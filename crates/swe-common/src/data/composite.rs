//! Composite storage: fixed concatenations and growable lists of blocks.

use crate::error::DataResult;
use crate::value::Value;

use super::DataBlock;

/// A fixed, ordered concatenation of heterogeneous blocks.
///
/// Atom `i` lives in whichever child covers it, found by walking the
/// children's atom counts. The cached total is recomputed on every
/// structural change made through this type.
#[derive(Debug, Default)]
pub struct MixedBlock {
    blocks: Vec<DataBlock>,
    atom_count: usize,
}

impl MixedBlock {
    pub fn new(blocks: Vec<DataBlock>) -> Self {
        let mut block = Self {
            blocks,
            atom_count: 0,
        };
        block.update_atom_count();
        block
    }

    pub fn atom_count(&self) -> usize {
        self.atom_count
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, index: usize) -> &DataBlock {
        &self.blocks[index]
    }

    pub fn blocks(&self) -> impl Iterator<Item = &DataBlock> {
        self.blocks.iter()
    }

    pub fn push(&mut self, block: DataBlock) {
        self.atom_count += block.atom_count();
        self.blocks.push(block);
    }

    pub fn remove(&mut self, index: usize) -> DataBlock {
        let removed = self.blocks.remove(index);
        self.atom_count -= removed.atom_count();
        removed
    }

    /// Replace child `index`, returning the previous block.
    pub fn set_block(&mut self, index: usize, block: DataBlock) -> DataBlock {
        let previous = std::mem::replace(&mut self.blocks[index], block);
        self.update_atom_count();
        previous
    }

    /// Mutate child `index` in place; the total is recomputed afterwards.
    pub fn update_block<R>(&mut self, index: usize, f: impl FnOnce(&mut DataBlock) -> R) -> R {
        let result = f(&mut self.blocks[index]);
        self.update_atom_count();
        result
    }

    pub fn value(&self, index: usize) -> Value {
        let (child, offset) = self.locate(index);
        self.blocks[child].value(offset)
    }

    pub fn set_value(&self, index: usize, value: &Value) -> DataResult<()> {
        let (child, offset) = self.locate(index);
        self.blocks[child].set_value(offset, value)
    }

    pub fn alias(&self) -> Self {
        Self {
            blocks: self.blocks.iter().map(DataBlock::alias).collect(),
            atom_count: self.atom_count,
        }
    }

    pub fn deep_copy(&self) -> Self {
        Self {
            blocks: self.blocks.iter().map(DataBlock::deep_copy).collect(),
            atom_count: self.atom_count,
        }
    }

    pub fn renew(&self) -> Self {
        Self {
            blocks: self.blocks.iter().map(DataBlock::renew).collect(),
            atom_count: self.atom_count,
        }
    }

    fn update_atom_count(&mut self) {
        self.atom_count = self.blocks.iter().map(DataBlock::atom_count).sum();
    }

    fn locate(&self, mut index: usize) -> (usize, usize) {
        for (i, block) in self.blocks.iter().enumerate() {
            let count = block.atom_count();
            if index < count {
                return (i, index);
            }
            index -= count;
        }
        panic!(
            "index out of range for mixed block of {} atoms",
            self.atom_count
        );
    }
}

/// A growable sequence of homogeneous element blocks.
///
/// Elements are held in a vector, so indexed access is O(1) and `add` is
/// amortized O(1). The atom count is maintained incrementally.
#[derive(Debug, Default)]
pub struct ListBlock {
    blocks: Vec<DataBlock>,
    atom_count: usize,
}

impl ListBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            blocks: Vec::with_capacity(capacity),
            atom_count: 0,
        }
    }

    pub fn atom_count(&self) -> usize {
        self.atom_count
    }

    /// Number of element blocks.
    pub fn size(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn add(&mut self, block: DataBlock) {
        self.atom_count += block.atom_count();
        self.blocks.push(block);
    }

    pub fn get(&self, index: usize) -> &DataBlock {
        &self.blocks[index]
    }

    pub fn elements(&self) -> impl Iterator<Item = &DataBlock> {
        self.blocks.iter()
    }

    /// Replace element `index`, returning the previous block.
    pub fn replace(&mut self, index: usize, block: DataBlock) -> DataBlock {
        self.atom_count += block.atom_count();
        let previous = std::mem::replace(&mut self.blocks[index], block);
        self.atom_count -= previous.atom_count();
        previous
    }

    /// Drop elements past `size`.
    pub fn truncate(&mut self, size: usize) {
        for removed in self.blocks.drain(size.min(self.blocks.len())..) {
            self.atom_count -= removed.atom_count();
        }
    }

    pub fn value(&self, index: usize) -> Value {
        let (element, offset) = self.locate(index);
        self.blocks[element].value(offset)
    }

    pub fn set_value(&self, index: usize, value: &Value) -> DataResult<()> {
        let (element, offset) = self.locate(index);
        self.blocks[element].set_value(offset, value)
    }

    pub fn alias(&self) -> Self {
        Self {
            blocks: self.blocks.iter().map(DataBlock::alias).collect(),
            atom_count: self.atom_count,
        }
    }

    pub fn deep_copy(&self) -> Self {
        Self {
            blocks: self.blocks.iter().map(DataBlock::deep_copy).collect(),
            atom_count: self.atom_count,
        }
    }

    pub fn renew(&self) -> Self {
        Self {
            blocks: self.blocks.iter().map(DataBlock::renew).collect(),
            atom_count: self.atom_count,
        }
    }

    fn locate(&self, mut index: usize) -> (usize, usize) {
        for (i, block) in self.blocks.iter().enumerate() {
            let count = block.atom_count();
            if index < count {
                return (i, index);
            }
            index -= count;
        }
        panic!(
            "index out of range for list block of {} atoms",
            self.atom_count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ScalarBlock;

    fn doubles(values: &[f64]) -> DataBlock {
        DataBlock::Double(ScalarBlock::from_vec(values.to_vec()))
    }

    #[test]
    fn test_mixed_dispatches_by_cumulative_count() {
        let mixed = MixedBlock::new(vec![
            DataBlock::Int(ScalarBlock::from_vec(vec![7])),
            doubles(&[1.5, 2.5]),
        ]);
        assert_eq!(mixed.atom_count(), 3);
        assert_eq!(mixed.value(0), Value::Int(7));
        assert_eq!(mixed.value(2), Value::Double(2.5));
    }

    #[test]
    fn test_mixed_structural_changes_update_count() {
        let mut mixed = MixedBlock::new(vec![doubles(&[1.0])]);
        mixed.push(doubles(&[2.0, 3.0]));
        assert_eq!(mixed.atom_count(), 3);

        mixed.update_block(1, |b| {
            if let DataBlock::Double(d) = b {
                d.resize(5);
            }
        });
        assert_eq!(mixed.atom_count(), 6);

        mixed.remove(0);
        assert_eq!(mixed.atom_count(), 5);
    }

    #[test]
    fn test_list_counts_incrementally() {
        let mut list = ListBlock::new();
        list.add(doubles(&[1.0, 2.0]));
        list.add(doubles(&[3.0]));
        assert_eq!(list.size(), 2);
        assert_eq!(list.atom_count(), 3);
        assert_eq!(list.value(2), Value::Double(3.0));

        list.replace(0, doubles(&[9.0]));
        assert_eq!(list.atom_count(), 2);

        list.truncate(1);
        assert_eq!(list.size(), 1);
        assert_eq!(list.atom_count(), 1);
    }
}
