//! Transaction Log Module
//!
//! Durable record of a replica's in-flight two-phase-commit transaction.
//!
//! ## Core Concepts
//! - **File per entry**: Each record is written atomically to its own `<index>.entry` file.
//! - **Ordering**: Indices are contiguous from 0, so append order is recovered by counting up.
//! - **Replay**: After a crash the replica iterates the log from the beginning to rebuild
//!   its transaction state.

pub mod log;
pub mod types;

pub use log::TxLog;
pub use types::{EntryKind, LogEntry};
