//! HTTP Gateway Module
//!
//! An optional JSON front door for the coordinator, for clients that would
//! rather speak HTTP than the framed socket protocol.
//!
//! ## Core Concepts
//! - **Routes**: `/kv/:key` maps GET/PUT/DELETE onto the coordinator's read and
//!   two-phase commit paths; `/info` returns the coordinator's INFO text.
//! - **Status codes**: The coordinator's response message is mapped onto an HTTP status,
//!   and the message itself is returned in the body.

pub mod handlers;
pub mod protocol;

pub use handlers::router;

#[cfg(test)]
mod tests;
