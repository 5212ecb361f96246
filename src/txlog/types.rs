use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Put,
    Del,
    Commit,
    Abort,
}

/// A single durable log record.
///
/// `data` holds the key followed by the value, each terminated by a NUL
/// byte; `length` is the total payload size in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub kind: EntryKind,
    pub length: u32,
    pub data: Vec<u8>,
}

impl LogEntry {
    pub fn new(kind: EntryKind, key: Option<&str>, value: Option<&str>) -> Self {
        let mut data = Vec::new();
        for field in [key, value].into_iter().flatten() {
            data.extend_from_slice(field.as_bytes());
            data.push(0);
        }

        Self {
            kind,
            length: data.len() as u32,
            data,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.field(0)
    }

    pub fn value(&self) -> Option<&str> {
        self.field(1)
    }

    fn field(&self, index: usize) -> Option<&str> {
        self.data
            .split(|b| *b == 0)
            .take(self.fields())
            .nth(index)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    fn fields(&self) -> usize {
        self.data.iter().filter(|b| **b == 0).count()
    }
}
