//! Replicated Key-Value Store Library
//!
//! This library crate defines the modules behind the `kvstore` binary (`main.rs`):
//! a coordinator that shards keys over a ring of replicas and makes every write
//! atomic across a key's replicas with two-phase commit.
//!
//! ## Architecture Modules
//! - **`coordinator`**: The "master". Consistent hashing ring of replicas, read routing with a
//!   coordinator-side cache, and the two-phase commit driver for PUT/DEL.
//! - **`replica`**: The "slave". Serves reads from its cache and durable store, votes on writes,
//!   applies decisions, and rebuilds its state from the transaction log after a crash.
//! - **`network`** / **`protocol`**: Framed request/response exchange over TCP and the
//!   accept-loop plus worker-pool server both node roles run.
//! - **`storage`** / **`txlog`**: On-disk hashed-bucket store and the file-per-entry
//!   transaction log.
//! - **`cache`** / **`queue`**: Set-associative clock-eviction cache and the blocking work
//!   queue feeding the server workers.
//! - **`gateway`**: Optional HTTP/JSON front door for the coordinator.

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod hash;
pub mod network;
pub mod protocol;
pub mod queue;
pub mod replica;
pub mod storage;
pub mod txlog;

pub use error::{KvError, Result};
