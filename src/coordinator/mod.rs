//! Coordinator Module
//!
//! The "master" node: shards keys across replicas and drives two-phase commit.
//!
//! ## Core Concepts
//! - **Ring**: Replicas sit on a consistent hashing ring ordered by the hash of `"<port>:<host>"`.
//!   A key belongs to the first replica at or after its hash and to that replica's successors.
//! - **Capacity**: Requests that reach replicas are only served once exactly `slave_capacity`
//!   replicas have registered.
//! - **Two-phase commit**: PUT/DEL collect a vote from every replica holding the key, then deliver
//!   COMMIT or ABORT to each one, retrying until every replica acknowledges.
//! - **Single transaction**: One write is in flight at a time; concurrent writes are rejected.
//! - **Observer**: Optional hooks fired on unreachable replicas and between the two phases.

pub mod coordinator;
pub mod observer;
pub mod ring;

pub use coordinator::Coordinator;
pub use observer::{NoopObserver, TpcObserver};
pub use ring::{ReplicaInfo, Ring};
