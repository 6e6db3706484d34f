use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one running instance of a workspace.
///
/// Used as the primary key of both runtime caches. Fields are private so an
/// identity cannot be altered once it has been handed to a cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeIdentity {
    workspace_id: String,
    env_name: String,
    owner_id: String,
    infra_namespace: String,
}

impl RuntimeIdentity {
    pub fn new(
        workspace_id: impl Into<String>,
        env_name: impl Into<String>,
        owner_id: impl Into<String>,
        infra_namespace: impl Into<String>,
    ) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            env_name: env_name.into(),
            owner_id: owner_id.into(),
            infra_namespace: infra_namespace.into(),
        }
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn infra_namespace(&self) -> &str {
        &self.infra_namespace
    }
}

impl fmt::Display for RuntimeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}@{}",
            self.workspace_id, self.env_name, self.owner_id, self.infra_namespace
        )
    }
}
