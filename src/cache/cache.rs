use super::set::CacheSet;
use crate::error::{KvError, Result};
use crate::hash::hash_64_bit;

use parking_lot::RwLock;

/// Array of independently locked cache sets.
pub struct Cache {
    sets: Vec<RwLock<CacheSet>>,
}

impl Cache {
    /// Creates a cache with `num_sets` sets of `elem_per_set` entries each.
    pub fn new(num_sets: usize, elem_per_set: usize) -> Result<Self> {
        if num_sets == 0 {
            return Err(KvError::Init("cache needs at least one set".to_string()));
        }

        let sets = (0..num_sets)
            .map(|_| CacheSet::new(elem_per_set).map(RwLock::new))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { sets })
    }

    fn set_index(&self, key: &str) -> usize {
        (hash_64_bit(key) as u64 % self.sets.len() as u64) as usize
    }

    /// Lock guarding the set that `key` maps to.
    ///
    /// Keys in the same set share one lock; callers that need to read, fetch
    /// and populate atomically should hold the write half of this lock and
    /// operate on the guarded `CacheSet` directly.
    pub fn getlock(&self, key: &str) -> &RwLock<CacheSet> {
        &self.sets[self.set_index(key)]
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.getlock(key).read().get(key)
    }

    pub fn put(&self, key: &str, value: &str) {
        self.getlock(key).write().put(key, value);
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.getlock(key).write().delete(key)
    }

    /// Empties every set.
    pub fn clear(&self) {
        for set in &self.sets {
            set.write().clear();
        }
    }

    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }
}
