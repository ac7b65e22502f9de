use std::collections::{BTreeMap, HashMap};

use alloy::primitives::BlockNumber;

use crate::log::DedupKey;

/// Keys of already delivered log occurrences, indexed by block so old keys can be evicted.
#[derive(Clone, Debug, Default)]
pub(crate) struct SeenSet {
    keys: HashMap<DedupKey, BlockNumber>,
    by_block: BTreeMap<BlockNumber, Vec<DedupKey>>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &DedupKey) -> bool {
        self.keys.contains_key(key)
    }

    /// Records `key` as observed in `block`. Returns `false` if it was already present.
    pub fn insert(&mut self, key: DedupKey, block: BlockNumber) -> bool {
        if self.keys.contains_key(&key) {
            return false;
        }
        self.keys.insert(key, block);
        self.by_block.entry(block).or_default().push(key);
        true
    }

    /// Evicts every key observed in a block strictly below `cutoff`, returning how many were
    /// removed.
    pub fn evict_below(&mut self, cutoff: BlockNumber) -> usize {
        let retained = self.by_block.split_off(&cutoff);
        let evicted = std::mem::replace(&mut self.by_block, retained);

        let mut count = 0;
        for key in evicted.into_values().flatten() {
            self.keys.remove(&key);
            count += 1;
        }
        count
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Lowest block that still has a retained key.
    pub fn oldest_block(&self) -> Option<BlockNumber> {
        self.by_block.keys().next().copied()
    }
}
