use super::ring::ReplicaInfo;

/// Hooks the coordinator calls while driving a two-phase commit.
///
/// Both methods are called synchronously from the transaction in progress and
/// default to doing nothing.
pub trait TpcObserver: Send + Sync {
    /// A replica could not be connected to, in either phase.
    fn on_unreachable(&self, _replica: &ReplicaInfo) {}

    /// Voting is over and the decision is about to be sent.
    fn on_phase_transition(&self) {}
}

pub struct NoopObserver;

impl TpcObserver for NoopObserver {}
