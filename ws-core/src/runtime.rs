use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::identity::RuntimeIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkspaceStatus {
    Starting,
    Running,
    Stopping,
    Stopped,
    StoppedAbnormally,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineStatus {
    Starting,
    Running,
    Failed,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerStatus {
    Unknown,
    Running,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    pub command_line: String,
    #[serde(rename = "type")]
    pub command_type: String,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
}

impl Command {
    pub fn new(
        name: impl Into<String>,
        command_line: impl Into<String>,
        command_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            command_line: command_line.into(),
            command_type: command_type.into(),
            attributes: IndexMap::new(),
        }
    }
}

/// Orchestration status and commands of one running workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeState {
    pub identity: RuntimeIdentity,
    pub status: WorkspaceStatus,
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl RuntimeState {
    pub fn new(identity: RuntimeIdentity, status: WorkspaceStatus) -> Self {
        Self {
            identity,
            status,
            commands: Vec::new(),
        }
    }

    pub fn with_commands(mut self, commands: Vec<Command>) -> Self {
        self.commands = commands;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerState {
    pub url: String,
    pub status: ServerStatus,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
}

impl ServerState {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: ServerStatus::Unknown,
            attributes: IndexMap::new(),
        }
    }
}

/// A placed machine of a runtime together with the servers it exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineState {
    pub runtime_identity: RuntimeIdentity,
    pub machine_name: String,
    pub pod_name: String,
    pub container_name: String,
    pub status: MachineStatus,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    #[serde(default)]
    pub servers: IndexMap<String, ServerState>,
}

impl MachineState {
    pub fn new(
        runtime_identity: RuntimeIdentity,
        pod_name: impl Into<String>,
        container_name: impl Into<String>,
    ) -> Self {
        let pod_name = pod_name.into();
        let container_name = container_name.into();
        Self {
            runtime_identity,
            machine_name: format!("{}/{}", pod_name, container_name),
            pod_name,
            container_name,
            status: MachineStatus::Starting,
            attributes: IndexMap::new(),
            servers: IndexMap::new(),
        }
    }

    pub fn with_server(mut self, name: impl Into<String>, server: ServerState) -> Self {
        self.servers.insert(name.into(), server);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
