//! Replica Module
//!
//! Storage node ("slave") holding a share of the keyspace under the coordinator's direction.
//!
//! ## Core Concepts
//! - **Standalone mode**: Without two-phase commit, PUT/DEL hit the store directly.
//! - **Cohort mode**: PUT/DEL are vote requests; the operation is logged and buffered until
//!   the coordinator sends COMMIT or ABORT.
//! - **Single transaction**: Only one vote may be outstanding; further writes are rejected
//!   until the decision arrives.
//! - **Crash recovery**: `rebuild_state` replays the transaction log so a restarted replica
//!   resumes exactly where it stopped.

pub mod server;
pub mod state;

pub use server::KvServer;
pub use state::{Operation, TpcState};
