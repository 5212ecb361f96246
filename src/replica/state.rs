use crate::txlog::{EntryKind, LogEntry};

/// A buffered single-key mutation awaiting the coordinator's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Put { key: String, value: String },
    Del { key: String },
}

impl Operation {
    pub fn key(&self) -> &str {
        match self {
            Operation::Put { key, .. } | Operation::Del { key } => key,
        }
    }

    pub fn log_kind(&self) -> EntryKind {
        match self {
            Operation::Put { .. } => EntryKind::Put,
            Operation::Del { .. } => EntryKind::Del,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Operation::Put { value, .. } => Some(value),
            Operation::Del { .. } => None,
        }
    }

    /// Rebuilds the operation recorded by a PUT or DEL log entry.
    pub fn from_entry(entry: &LogEntry) -> Option<Self> {
        let key = entry.key()?.to_string();
        match entry.kind {
            EntryKind::Put => Some(Operation::Put {
                key,
                value: entry.value()?.to_string(),
            }),
            EntryKind::Del => Some(Operation::Del { key }),
            EntryKind::Commit | EntryKind::Abort => None,
        }
    }
}

/// Replica side of the two-phase commit state machine.
///
/// `Commit` and `Abort` mean the decision for the last transaction is durable
/// and the replica is ready for the next vote, exactly like `Ready`; they only
/// record how the previous transaction ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TpcState {
    Ready,
    Init(Operation),
    Commit,
    Abort,
}

impl TpcState {
    pub fn is_pending(&self) -> bool {
        matches!(self, TpcState::Init(_))
    }
}
