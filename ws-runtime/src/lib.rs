//! In-memory source of truth for what is running in each workspace.
//!
//! [`RuntimeStateCache`] tracks the orchestration status and commands of every
//! runtime and owns the [`MachineCache`] holding its machines and servers.
//! Removing a runtime removes its machines in the same step, after giving
//! registered [`RuntimeRemovalObserver`]s a chance to veto.

pub mod machine;
pub mod removal;
pub mod runtime_state;

pub use machine::MachineCache;
pub use removal::{PendingRemoval, RuntimeRemovalObserver};
pub use runtime_state::RuntimeStateCache;
pub use ws_core::{Result, WorkspaceError};

pub(crate) fn poisoned<T>(_: T) -> WorkspaceError {
    WorkspaceError::Internal("Runtime cache lock poisoned".to_string())
}
