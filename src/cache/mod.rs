//! Fixed-Capacity Cache Module
//!
//! In-memory cache placed in front of the durable store, used both by the
//! coordinator (to answer repeated GETs without contacting replicas) and by
//! every replica (to answer GETs without touching disk).
//!
//! ## Core Concepts
//! - **Cache Set**: A bounded group of entries evicted with the clock
//!   (reference-bit) algorithm. Each set is guarded by its own reader-writer lock.
//! - **Cache**: A fixed array of sets. A key hashes to exactly one set.
//! - **Per-key locking**: `Cache::getlock` hands out the lock of the key's set so a
//!   caller can hold it across a "check cache, fetch from store, populate cache"
//!   sequence and avoid duplicate fetches on concurrent misses.

pub mod cache;
pub mod set;

pub use cache::Cache;
pub use set::CacheSet;
