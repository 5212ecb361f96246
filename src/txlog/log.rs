use super::types::{EntryKind, LogEntry};
use crate::error::Result;
use crate::storage::store::write_atomic;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File extension shared by every log record.
pub const LOG_EXTENSION: &str = "entry";

/// Append-only transaction log with one file per record.
///
/// Records are named `<index>.entry` with indices contiguous from 0. Once
/// `log` returns, the record is on disk. Only the contiguous run starting at
/// `0.entry` belongs to the log; any record after a gap is left over from an
/// interrupted clear and is deleted when the log is opened.
pub struct TxLog {
    dirname: PathBuf,
    next_index: u64,
    cursor: u64,
}

impl TxLog {
    /// Opens the log in `dirname`, continuing after any records already present.
    pub fn new(dirname: impl AsRef<Path>) -> Result<Self> {
        let dirname = dirname.as_ref().to_path_buf();
        fs::create_dir_all(&dirname)?;

        let mut next_index = 0;
        while dirname.join(Self::file_name(next_index)).exists() {
            next_index += 1;
        }
        let stale = remove_records(&dirname, next_index)?;
        if stale > 0 {
            tracing::warn!(
                "Removed {} stale log entries past index {} in {:?}",
                stale,
                next_index,
                dirname
            );
        }

        tracing::debug!(
            "Opened transaction log at {:?} with {} existing entries",
            dirname,
            next_index
        );

        Ok(Self {
            dirname,
            next_index,
            cursor: 0,
        })
    }

    pub fn dirname(&self) -> &Path {
        &self.dirname
    }

    /// Number of records since the last clear.
    pub fn len(&self) -> u64 {
        self.next_index
    }

    pub fn is_empty(&self) -> bool {
        self.next_index == 0
    }

    pub fn log(&mut self, kind: EntryKind, key: Option<&str>, value: Option<&str>) -> Result<()> {
        let entry = LogEntry::new(kind, key, value);
        write_atomic(&self.entry_path(self.next_index), &bincode::serialize(&entry)?)?;
        self.next_index += 1;
        Ok(())
    }

    /// Removes every record and restarts indexing at 0.
    ///
    /// Records go in ascending order, so a crash part way leaves a gap at
    /// index 0 and reopening discards the rest.
    pub fn clear_log(&mut self) -> Result<()> {
        for index in 0..self.next_index {
            remove_if_present(&self.entry_path(index))?;
        }
        remove_records(&self.dirname, 0)?;
        self.next_index = 0;
        self.cursor = 0;
        Ok(())
    }

    pub fn iterate_begin(&mut self) {
        self.cursor = 0;
    }

    pub fn iterate_has_next(&self) -> bool {
        self.cursor < self.next_index
    }

    /// Loads the record under the cursor and advances, or `None` past the end.
    pub fn iterate_next(&mut self) -> Result<Option<LogEntry>> {
        if !self.iterate_has_next() {
            return Ok(None);
        }
        let entry = Self::load_entry(self.entry_path(self.cursor))?;
        self.cursor += 1;
        Ok(Some(entry))
    }

    pub fn load_entry(path: impl AsRef<Path>) -> Result<LogEntry> {
        let bytes = fs::read(path)?;
        Ok(bincode::deserialize(&bytes)?)
    }

    pub fn entry_path(&self, index: u64) -> PathBuf {
        self.dirname.join(Self::file_name(index))
    }

    fn file_name(index: u64) -> String {
        format!("{}.{}", index, LOG_EXTENSION)
    }
}

/// Deletes every `<index>.entry` in `dirname` with `index >= from`.
fn remove_records(dirname: &Path, from: u64) -> Result<usize> {
    let mut removed = 0;
    for dir_entry in fs::read_dir(dirname)? {
        let path = dir_entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(LOG_EXTENSION) {
            continue;
        }
        let index = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<u64>().ok());
        if matches!(index, Some(index) if index >= from) {
            remove_if_present(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
