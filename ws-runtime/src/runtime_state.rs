// Standard library imports
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

// External crate imports
use tracing::{info, instrument};

// Internal imports
use ws_core::{Command, Result, RuntimeIdentity, RuntimeState, WorkspaceError, WorkspaceStatus};

use crate::machine::MachineCache;
use crate::poisoned;
use crate::removal::{PendingRemoval, RuntimeRemovalObserver};

type StateMap = HashMap<RuntimeIdentity, RuntimeState>;

/// Runtime states keyed by identity.
///
/// Every operation on a key is atomic with respect to the others. Lock order
/// is observers, then states, then machines; [`MachineCache`] on its own only
/// ever takes the machines lock.
pub struct RuntimeStateCache {
    states: RwLock<StateMap>,
    machines: Arc<MachineCache>,
    observers: RwLock<Vec<Arc<dyn RuntimeRemovalObserver>>>,
}

fn state_not_found(identity: &RuntimeIdentity) -> WorkspaceError {
    WorkspaceError::NotFound(format!(
        "Runtime state for workspace '{}' was not found",
        identity.workspace_id()
    ))
}

impl RuntimeStateCache {
    pub fn new(machines: Arc<MachineCache>) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            machines,
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn machines(&self) -> &Arc<MachineCache> {
        &self.machines
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StateMap>> {
        self.states.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StateMap>> {
        self.states.write().map_err(poisoned)
    }

    pub fn add_observer(&self, observer: Arc<dyn RuntimeRemovalObserver>) -> Result<()> {
        self.observers.write().map_err(poisoned)?.push(observer);
        Ok(())
    }

    /// Stores the state unless one already exists for its identity. Returns
    /// whether it was stored.
    pub fn put_if_absent(&self, state: RuntimeState) -> Result<bool> {
        let mut states = self.write()?;
        if states.contains_key(&state.identity) {
            return Ok(false);
        }
        tracing::debug!(
            workspace_id = %state.identity.workspace_id(),
            status = ?state.status,
            "Runtime state added"
        );
        states.insert(state.identity.clone(), state);
        Ok(true)
    }

    pub fn get(&self, identity: &RuntimeIdentity) -> Result<Option<RuntimeState>> {
        Ok(self.read()?.get(identity).cloned())
    }

    pub fn get_identities(&self) -> Result<Vec<RuntimeIdentity>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    pub fn get_status(&self, identity: &RuntimeIdentity) -> Result<WorkspaceStatus> {
        self.read()?
            .get(identity)
            .map(|s| s.status)
            .ok_or_else(|| state_not_found(identity))
    }

    pub fn update_status(&self, identity: &RuntimeIdentity, status: WorkspaceStatus) -> Result<()> {
        let mut states = self.write()?;
        let state = states
            .get_mut(identity)
            .ok_or_else(|| state_not_found(identity))?;
        state.status = status;
        Ok(())
    }

    /// Compare-and-swap on the status: writes `new_status` only if `predicate`
    /// holds for the current one, and returns whether it did. An absent state
    /// yields `false`.
    pub fn update_status_if<P>(
        &self,
        identity: &RuntimeIdentity,
        predicate: P,
        new_status: WorkspaceStatus,
    ) -> Result<bool>
    where
        P: FnOnce(WorkspaceStatus) -> bool,
    {
        let mut states = self.write()?;
        let Some(state) = states.get_mut(identity) else {
            return Ok(false);
        };
        if !predicate(state.status) {
            return Ok(false);
        }
        tracing::debug!(
            workspace_id = %identity.workspace_id(),
            from = ?state.status,
            to = ?new_status,
            "Runtime status changed"
        );
        state.status = new_status;
        Ok(true)
    }

    pub fn get_commands(&self, identity: &RuntimeIdentity) -> Result<Vec<Command>> {
        self.read()?
            .get(identity)
            .map(|s| s.commands.clone())
            .ok_or_else(|| state_not_found(identity))
    }

    /// Replaces the whole command list.
    pub fn update_commands(&self, identity: &RuntimeIdentity, commands: Vec<Command>) -> Result<()> {
        let mut states = self.write()?;
        let state = states
            .get_mut(identity)
            .ok_or_else(|| state_not_found(identity))?;
        state.commands = commands;
        Ok(())
    }

    /// Removes a runtime state together with all of its machines.
    ///
    /// The machines are staged and shown to every observer first. If any
    /// observer fails, nothing is removed and its error is returned. Otherwise
    /// both removals are committed before either lock is released, so readers
    /// never see the runtime gone while its machines remain.
    ///
    /// Machines cached without a runtime state are dropped without consulting
    /// observers, and `None` is returned.
    #[instrument(skip(self), fields(workspace_id = %identity.workspace_id()))]
    pub fn remove(&self, identity: &RuntimeIdentity) -> Result<Option<RuntimeState>> {
        let observers = self.observers.read().map_err(poisoned)?;
        let mut states = self.write()?;
        let mut machines = self.machines.write()?;
        let Some(state) = states.get(identity) else {
            if let Some(orphans) = machines.remove(identity) {
                tracing::warn!("Dropped {} machines without runtime state", orphans.len());
            }
            return Ok(None);
        };

        let staged: Vec<_> = machines
            .get(identity)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        let pending = PendingRemoval {
            identity,
            state,
            machines: &staged,
        };
        for observer in observers.iter() {
            if let Err(e) = observer.before_remove(&pending) {
                tracing::warn!("Runtime removal rolled back: {}", e);
                return Err(e);
            }
        }

        machines.remove(identity);
        let removed = states.remove(identity);
        info!("Removed runtime state and {} machines", staged.len());
        Ok(removed)
    }
}

impl std::fmt::Debug for RuntimeStateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("RuntimeStateCache")
            .field("states", &self.states)
            .field("machines", &self.machines)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ws_core::{ErrorKind, MachineState};

    fn identity(id: &str) -> RuntimeIdentity {
        RuntimeIdentity::new(id, "default", "alice", "alice-che")
    }

    fn cache() -> RuntimeStateCache {
        RuntimeStateCache::new(Arc::new(MachineCache::new()))
    }

    #[test]
    fn test_get_identities() -> anyhow::Result<()> {
        let cache = cache();
        cache.put_if_absent(RuntimeState::new(identity("ws1"), WorkspaceStatus::Starting))?;
        cache.put_if_absent(RuntimeState::new(identity("ws2"), WorkspaceStatus::Running))?;

        let mut ids: Vec<String> = cache
            .get_identities()?
            .iter()
            .map(|i| i.workspace_id().to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["ws1", "ws2"]);
        Ok(())
    }

    #[test]
    fn test_missing_state_is_not_found() {
        let cache = cache();
        let id = identity("ghost");

        assert_eq!(cache.get_status(&id).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            cache
                .update_status(&id, WorkspaceStatus::Running)
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(cache.get_commands(&id).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            cache.update_commands(&id, Vec::new()).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_conditional_update_on_absent_state() -> anyhow::Result<()> {
        let cache = cache();
        assert!(!cache.update_status_if(&identity("ghost"), |_| true, WorkspaceStatus::Running)?);
        Ok(())
    }

    #[test]
    fn test_remove_absent_state() -> anyhow::Result<()> {
        assert!(cache().remove(&identity("ghost"))?.is_none());
        Ok(())
    }

    #[test]
    fn test_remove_drops_machines_without_state() -> anyhow::Result<()> {
        let cache = cache();
        let id = identity("ghost");
        cache.machines().put(MachineState::new(id.clone(), "pod1", "dev"))?;
        cache.machines().put(MachineState::new(id.clone(), "pod1", "db"))?;

        assert!(cache.remove(&id)?.is_none());
        assert!(cache.machines().get_machines(&id)?.is_empty());
        Ok(())
    }
}
