//! Durable Storage Module
//!
//! Persistent key/value storage owned by each replica.
//!
//! ## Core Concepts
//! - **Buckets**: Keys are hashed into a fixed number of buckets; each bucket is a
//!   contiguous chain of entry files on disk.
//! - **Atomic writes**: Entries are written to a temporary file and renamed into place,
//!   so a crash never leaves a half-written entry behind.
//! - **Limits**: Keys longer than `MAX_KEYLEN` and values longer than `MAX_VALLEN` are rejected
//!   before any disk access.

pub mod store;

pub use store::{KvStore, MAX_KEYLEN, MAX_VALLEN};
