use crate::error::{KvError, Result};
use crate::hash::hash_64_bit;

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

/// A registered replica and its position on the ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaInfo {
    pub id: i64,
    pub host: String,
    pub port: u16,
}

impl ReplicaInfo {
    /// Places the replica at the hash of `"<port>:<host>"`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let id = hash_64_bit(&format!("{}:{}", port, host));
        Self { id, host, port }
    }

    pub fn with_id(id: i64, host: impl Into<String>, port: u16) -> Self {
        Self {
            id,
            host: host.into(),
            port,
        }
    }
}

/// Consistent hashing ring of replicas ordered by id.
pub struct Ring {
    replicas: RwLock<BTreeMap<i64, ReplicaInfo>>,
    capacity: usize,
}

impl Ring {
    pub fn new(capacity: usize) -> Self {
        Self {
            replicas: RwLock::new(BTreeMap::new()),
            capacity,
        }
    }

    pub fn register(&self, host: &str, port: u16) -> Result<ReplicaInfo> {
        let info = ReplicaInfo::new(host, port);
        self.insert(info.clone())?;
        Ok(info)
    }

    /// Adds `info` to the ring. Re-adding a known id succeeds without change;
    /// adding a new id to a full ring fails.
    pub fn insert(&self, info: ReplicaInfo) -> Result<()> {
        let mut replicas = self.replicas.write();
        if replicas.contains_key(&info.id) {
            return Ok(());
        }
        if replicas.len() >= self.capacity {
            return Err(KvError::Generic);
        }

        tracing::info!(
            "Registered replica {}:{} (id {}), {}/{}",
            info.host,
            info.port,
            info.id,
            replicas.len() + 1,
            self.capacity
        );
        replicas.insert(info.id, info);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.replicas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    /// First replica whose id is at or above the key's hash, wrapping to the lowest id.
    pub fn get_primary(&self, key: &str) -> Option<ReplicaInfo> {
        let replicas = self.replicas.read();
        Self::primary_in(&replicas, hash_64_bit(key)).cloned()
    }

    /// Next replica after `replica` in id order, wrapping to the lowest id.
    pub fn get_successor(&self, replica: &ReplicaInfo) -> Option<ReplicaInfo> {
        let replicas = self.replicas.read();
        Self::successor_in(&replicas, replica.id).cloned()
    }

    /// The primary for `key` followed by its successors, `count` replicas at most.
    pub fn replica_set(&self, key: &str, count: usize) -> Vec<ReplicaInfo> {
        let replicas = self.replicas.read();
        let mut set = Vec::with_capacity(count);

        let mut current = Self::primary_in(&replicas, hash_64_bit(key));
        while let Some(replica) = current {
            if set.len() == count.min(replicas.len()) {
                break;
            }
            set.push(replica.clone());
            current = Self::successor_in(&replicas, replica.id);
        }
        set
    }

    /// Every replica in id order.
    pub fn replicas(&self) -> Vec<ReplicaInfo> {
        self.replicas.read().values().cloned().collect()
    }

    fn primary_in(replicas: &BTreeMap<i64, ReplicaInfo>, hash: i64) -> Option<&ReplicaInfo> {
        replicas
            .range(hash..)
            .next()
            .or_else(|| replicas.iter().next())
            .map(|(_, info)| info)
    }

    fn successor_in(replicas: &BTreeMap<i64, ReplicaInfo>, id: i64) -> Option<&ReplicaInfo> {
        replicas
            .range((Excluded(id), Unbounded))
            .next()
            .or_else(|| replicas.iter().next())
            .map(|(_, info)| info)
    }
}
