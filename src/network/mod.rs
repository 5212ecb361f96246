//! Network Server Module
//!
//! TCP front end shared by the coordinator and the replicas.
//!
//! ## Core Concepts
//! - **Accept loop**: A single task accepts connections and pushes them onto a `WorkQueue`.
//! - **Worker pool**: `max_threads` workers pop connections and run one exchange each
//!   to completion.
//! - **Handler**: Node-specific logic implements the `Handler` trait.

pub mod server;

pub use server::{Handler, ServerHandle, SocketServer};

#[cfg(test)]
mod tests;
