use crate::error::{KvError, Result};
use crate::hash::hash_64_bit;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Longest key (in bytes) accepted anywhere in the system.
pub const MAX_KEYLEN: usize = 256;
/// Longest value (in bytes) accepted anywhere in the system.
pub const MAX_VALLEN: usize = 1024;

const DEFAULT_BUCKETS: u64 = 1024;
const ENTRY_EXTENSION: &str = "entry";

/// One key/value pair as written to disk.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    value: String,
}

/// Durable key/value store backed by a directory of entry files.
///
/// Keys hash into a fixed number of buckets. A bucket is a chain of files
/// `<bucket>-<n>.entry` with `n` contiguous from 0; colliding keys extend the
/// chain and deletes compact it by moving the tail entry into the hole.
pub struct KvStore {
    dirname: PathBuf,
    num_buckets: u64,
    lock: RwLock<()>,
}

impl KvStore {
    pub fn new(dirname: impl AsRef<Path>) -> Result<Self> {
        Self::with_buckets(dirname, DEFAULT_BUCKETS)
    }

    pub fn with_buckets(dirname: impl AsRef<Path>, num_buckets: u64) -> Result<Self> {
        if num_buckets == 0 {
            return Err(KvError::Init("store needs at least one bucket".to_string()));
        }

        let dirname = dirname.as_ref().to_path_buf();
        fs::create_dir_all(&dirname)?;

        Ok(Self {
            dirname,
            num_buckets,
            lock: RwLock::new(()),
        })
    }

    pub fn dirname(&self) -> &Path {
        &self.dirname
    }

    pub fn check_key(key: &str) -> Result<()> {
        if key.len() > MAX_KEYLEN {
            return Err(KvError::KeyTooLong);
        }
        Ok(())
    }

    pub fn check_value(value: &str) -> Result<()> {
        if value.len() > MAX_VALLEN {
            return Err(KvError::ValueTooLong);
        }
        Ok(())
    }

    /// Validates a key/value pair without touching disk.
    pub fn check_put(key: &str, value: &str) -> Result<()> {
        Self::check_key(key)?;
        Self::check_value(value)
    }

    pub fn get(&self, key: &str) -> Result<String> {
        Self::check_key(key)?;
        self.ensure_dir()?;

        let _guard = self.lock.read();
        match self.find(key)? {
            Some((_, entry)) => Ok(entry.value),
            None => Err(KvError::NoSuchKey),
        }
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        Self::check_put(key, value)?;
        self.ensure_dir()?;

        let _guard = self.lock.write();
        let bucket = self.bucket_of(key);
        let mut slot = 0;
        loop {
            match self.read_entry(&self.entry_path(bucket, slot))? {
                Some(entry) if entry.key != key => slot += 1,
                _ => break,
            }
        }

        let entry = StoredEntry {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.write_entry(&self.entry_path(bucket, slot), &entry)?;

        tracing::debug!("Stored key in bucket {} slot {}", bucket, slot);
        Ok(())
    }

    pub fn del(&self, key: &str) -> Result<()> {
        Self::check_key(key)?;
        self.ensure_dir()?;

        let _guard = self.lock.write();
        let bucket = self.bucket_of(key);
        let (slot, _) = self.find(key)?.ok_or(KvError::NoSuchKey)?;

        let mut last = slot;
        while self.entry_path(bucket, last + 1).exists() {
            last += 1;
        }

        let hole = self.entry_path(bucket, slot);
        if last == slot {
            fs::remove_file(&hole)?;
        } else {
            fs::rename(self.entry_path(bucket, last), &hole)?;
        }

        tracing::debug!("Deleted key from bucket {} slot {}", bucket, slot);
        Ok(())
    }

    /// Removes the whole store directory. Later calls report
    /// `StorageUnavailable` until a new store is created.
    pub fn clean(&self) -> Result<()> {
        let _guard = self.lock.write();
        match fs::remove_dir_all(&self.dirname) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn ensure_dir(&self) -> Result<()> {
        if self.dirname.is_dir() {
            Ok(())
        } else {
            Err(KvError::StorageUnavailable)
        }
    }

    fn bucket_of(&self, key: &str) -> u64 {
        hash_64_bit(key) as u64 % self.num_buckets
    }

    fn entry_path(&self, bucket: u64, slot: usize) -> PathBuf {
        self.dirname
            .join(format!("{}-{}.{}", bucket, slot, ENTRY_EXTENSION))
    }

    fn find(&self, key: &str) -> Result<Option<(usize, StoredEntry)>> {
        let bucket = self.bucket_of(key);
        let mut slot = 0;
        while let Some(entry) = self.read_entry(&self.entry_path(bucket, slot))? {
            if entry.key == key {
                return Ok(Some((slot, entry)));
            }
            slot += 1;
        }
        Ok(None)
    }

    fn read_entry(&self, path: &Path) -> Result<Option<StoredEntry>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entry(&self, path: &Path, entry: &StoredEntry) -> Result<()> {
        write_atomic(path, &bincode::serialize(entry)?)
    }
}

/// Writes `bytes` to a sibling temp file, syncs it, renames it over `path`,
/// then syncs the directory so the rename itself survives a power loss.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    if let Some(parent) = path.parent() {
        sync_dir(parent)?;
    }
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

// Directories cannot be opened as files here; the rename is as durable as it gets.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
