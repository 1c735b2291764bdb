use std::collections::BTreeSet;

use crate::row::CellKey;

/// Cells with a persistence call in flight. A cell in this set is disabled
/// regardless of the lock.
#[derive(Debug, Clone, Default)]
pub struct UpdatingSet {
    keys: BTreeSet<CellKey>,
}

impl UpdatingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as in flight. Returns `false` if it already was, which is
    /// how duplicate submissions are detected.
    pub fn insert(&mut self, key: CellKey) -> bool {
        self.keys.insert(key)
    }

    pub fn remove(&mut self, key: &CellKey) -> bool {
        self.keys.remove(key)
    }

    pub fn contains(&self, key: &CellKey) -> bool {
        self.keys.contains(key)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellKey> {
        self.keys.iter()
    }
}
