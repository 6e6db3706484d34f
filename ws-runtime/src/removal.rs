use ws_core::{MachineState, Result, RuntimeIdentity, RuntimeState};

/// A runtime removal that has been staged but not committed.
#[derive(Debug)]
pub struct PendingRemoval<'a> {
    pub identity: &'a RuntimeIdentity,
    pub state: &'a RuntimeState,
    pub machines: &'a [MachineState],
}

/// Observer consulted before a runtime and its machines are removed.
///
/// Returning an error aborts the removal; both caches stay as they were and
/// the error is handed back to the caller of
/// [`RuntimeStateCache::remove`](crate::RuntimeStateCache::remove).
///
/// Observers run while the caches are locked and must not call back into them.
pub trait RuntimeRemovalObserver: Send + Sync {
    fn before_remove(&self, removal: &PendingRemoval<'_>) -> Result<()>;
}
