// Standard library imports
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

// External crate imports
use indexmap::IndexMap;
use tracing::instrument;

// Internal imports
use ws_core::{
    MachineState, MachineStatus, Result, RuntimeIdentity, ServerState, ServerStatus,
    WorkspaceError,
};

use crate::poisoned;

pub(crate) type MachineMap = HashMap<RuntimeIdentity, IndexMap<String, MachineState>>;

/// Machines of every runtime, keyed by runtime identity and machine name.
///
/// Machines are normally removed together with their runtime through
/// [`RuntimeStateCache::remove`](crate::RuntimeStateCache::remove).
#[derive(Debug, Default)]
pub struct MachineCache {
    machines: RwLock<MachineMap>,
}

fn machine_not_found(identity: &RuntimeIdentity, machine: &str) -> WorkspaceError {
    WorkspaceError::NotFound(format!(
        "Machine '{}' of workspace '{}' was not found",
        machine,
        identity.workspace_id()
    ))
}

impl MachineCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MachineMap>> {
        self.machines.read().map_err(poisoned)
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, MachineMap>> {
        self.machines.write().map_err(poisoned)
    }

    /// Adds a machine under its runtime identity. A machine of the same name
    /// in the same runtime is a conflict.
    pub fn put(&self, machine: MachineState) -> Result<()> {
        let mut machines = self.write()?;
        let runtime = machines
            .entry(machine.runtime_identity.clone())
            .or_default();
        if runtime.contains_key(&machine.machine_name) {
            return Err(WorkspaceError::Conflict(format!(
                "Machine '{}' of workspace '{}' already exists",
                machine.machine_name,
                machine.runtime_identity.workspace_id()
            )));
        }
        tracing::debug!(
            workspace_id = %machine.runtime_identity.workspace_id(),
            machine = %machine.machine_name,
            "Machine added"
        );
        runtime.insert(machine.machine_name.clone(), machine);
        Ok(())
    }

    /// All machines of a runtime in insertion order; empty when there are none.
    pub fn get_machines(&self, identity: &RuntimeIdentity) -> Result<IndexMap<String, MachineState>> {
        Ok(self.read()?.get(identity).cloned().unwrap_or_default())
    }

    pub fn get_machine(&self, identity: &RuntimeIdentity, machine: &str) -> Result<Option<MachineState>> {
        Ok(self
            .read()?
            .get(identity)
            .and_then(|m| m.get(machine))
            .cloned())
    }

    pub fn update_machine_status(
        &self,
        identity: &RuntimeIdentity,
        machine: &str,
        status: MachineStatus,
    ) -> Result<()> {
        let mut machines = self.write()?;
        let state = machines
            .get_mut(identity)
            .and_then(|m| m.get_mut(machine))
            .ok_or_else(|| machine_not_found(identity, machine))?;
        state.status = status;
        Ok(())
    }

    /// Sets a server's status and reports whether it actually changed.
    pub fn update_server_status(
        &self,
        identity: &RuntimeIdentity,
        machine: &str,
        server: &str,
        status: ServerStatus,
    ) -> Result<bool> {
        let mut machines = self.write()?;
        let state = machines
            .get_mut(identity)
            .and_then(|m| m.get_mut(machine))
            .ok_or_else(|| machine_not_found(identity, machine))?;
        let server_state = state.servers.get_mut(server).ok_or_else(|| {
            WorkspaceError::NotFound(format!(
                "Server '{}' of machine '{}' in workspace '{}' was not found",
                server,
                machine,
                identity.workspace_id()
            ))
        })?;

        if server_state.status == status {
            return Ok(false);
        }
        server_state.status = status;
        Ok(true)
    }

    pub fn get_server(
        &self,
        identity: &RuntimeIdentity,
        machine: &str,
        server: &str,
    ) -> Result<Option<ServerState>> {
        Ok(self
            .read()?
            .get(identity)
            .and_then(|m| m.get(machine))
            .and_then(|m| m.servers.get(server))
            .cloned())
    }

    pub fn remove_machine(&self, identity: &RuntimeIdentity, machine: &str) -> Result<Option<MachineState>> {
        let mut machines = self.write()?;
        let Some(runtime) = machines.get_mut(identity) else {
            return Ok(None);
        };
        let removed = runtime.shift_remove(machine);
        if runtime.is_empty() {
            machines.remove(identity);
        }
        Ok(removed)
    }

    /// Drops every machine of a runtime without consulting removal observers.
    #[instrument(skip(self), fields(workspace_id = %identity.workspace_id()))]
    pub fn remove(&self, identity: &RuntimeIdentity) -> Result<Vec<MachineState>> {
        let removed = self
            .write()?
            .remove(identity)
            .map(|m| m.into_values().collect())
            .unwrap_or_default();
        Ok(removed)
    }
}
