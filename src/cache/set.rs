use crate::error::{KvError, Result};

use std::sync::atomic::{AtomicBool, Ordering};

/// A single cached key/value pair.
///
/// The reference bit is atomic so that `get` can mark an entry as recently
/// used while the owning set is only held under a shared lock.
#[derive(Debug)]
struct CacheEntry {
    key: String,
    value: String,
    referenced: AtomicBool,
}

impl CacheEntry {
    fn new(key: String, value: String) -> Self {
        Self {
            key,
            value,
            referenced: AtomicBool::new(false),
        }
    }
}

/// Bounded set of entries with clock eviction.
///
/// Entries are kept in insertion order; that order is the path the clock hand
/// sweeps when a slot has to be freed.
#[derive(Debug)]
pub struct CacheSet {
    entries: Vec<CacheEntry>,
    elem_per_set: usize,
}

impl CacheSet {
    /// Creates a set holding at most `elem_per_set` entries (at least 2).
    pub fn new(elem_per_set: usize) -> Result<Self> {
        if elem_per_set < 2 {
            return Err(KvError::Init(format!(
                "cache set needs at least 2 elements, got {}",
                elem_per_set
            )));
        }

        Ok(Self {
            entries: Vec::with_capacity(elem_per_set),
            elem_per_set,
        })
    }

    /// Returns the value for `key` and sets its reference bit.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.iter().find(|entry| entry.key == key).map(|entry| {
            entry.referenced.store(true, Ordering::Relaxed);
            entry.value.clone()
        })
    }

    /// Inserts or overwrites `key`. A full set evicts one entry first.
    ///
    /// Both new and overwritten entries start with a clear reference bit.
    pub fn put(&mut self, key: &str, value: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.key == key) {
            entry.value = value.to_string();
            entry.referenced.store(false, Ordering::Relaxed);
            return;
        }

        if self.entries.len() == self.elem_per_set {
            self.evict();
        }

        self.entries
            .push(CacheEntry::new(key.to_string(), value.to_string()));
    }

    /// Removes `key` from the set.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        match self.entries.iter().position(|entry| entry.key == key) {
            Some(idx) => {
                self.entries.remove(idx);
                Ok(())
            }
            None => Err(KvError::NoSuchKey),
        }
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.elem_per_set
    }

    /// Sweeps from the oldest entry, clearing set reference bits, and removes
    /// the first entry found with a clear bit. Terminates within two passes.
    fn evict(&mut self) {
        if self.entries.is_empty() {
            return;
        }

        let mut hand = 0;
        loop {
            if self.entries[hand].referenced.swap(false, Ordering::Relaxed) {
                hand = (hand + 1) % self.entries.len();
                continue;
            }

            let evicted = self.entries.remove(hand);
            tracing::trace!("Evicted cache entry {}", evicted.key);
            return;
        }
    }
}
