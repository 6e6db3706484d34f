//! Appliers mutate a [`WorkloadModel`] in place to inject one secret.
//!
//! Only pods with [`PodRole::Deployment`] are touched. Within those pods a
//! container receives the secret when automount applies to it:
//!
//! * its devfile component sets `automountWorkspaceSecrets: false` - never;
//! * its component sets `automountWorkspaceSecrets: true` - always;
//! * otherwise - only if the secret carries `automount-workspace-secret: true`.

mod env;
mod file;
mod git_credential;

pub use env::EnvSecretApplier;
pub use file::FileSecretApplier;
pub use git_credential::{GitCredentialSecretApplier, GIT_CONFIG_KEY};

use ws_core::{Component, PodRole, Result, RuntimeIdentity, Secret, WorkloadModel};

use crate::annotations::{self, AUTOMOUNT};

pub trait SecretApplier {
    fn apply_secret(
        &self,
        workload: &mut WorkloadModel,
        identity: &RuntimeIdentity,
        secret: &Secret,
    ) -> Result<()>;
}

/// A container of a deployment pod selected to receive a secret.
#[derive(Debug, Clone)]
pub(crate) struct MountTarget {
    pub pod: String,
    pub container: usize,
    pub component: Option<Component>,
}

pub(crate) fn automount_applies(component: Option<&Component>, secret: &Secret) -> bool {
    match component.and_then(|c| c.automount_workspace_secrets) {
        Some(enabled) => enabled,
        None => annotations::is_true(secret.annotation(AUTOMOUNT)),
    }
}

pub(crate) fn deployment_pods(workload: &WorkloadModel) -> Vec<String> {
    workload
        .pods
        .iter()
        .filter(|(_, pod)| pod.role == PodRole::Deployment)
        .map(|(name, _)| name.clone())
        .collect()
}

/// Containers of `pod_name` that should receive `secret`.
///
/// Resolved up front so the caller can mutate the workload afterwards.
pub(crate) fn mount_targets_in_pod(
    workload: &WorkloadModel,
    pod_name: &str,
    secret: &Secret,
) -> Vec<MountTarget> {
    let Some(pod) = workload.pods.get(pod_name) else {
        return Vec::new();
    };
    pod.containers
        .iter()
        .enumerate()
        .filter_map(|(idx, container)| {
            let component = workload.component_for(pod_name, &container.name);
            if !automount_applies(component, secret) {
                tracing::debug!(
                    secret = %secret.name,
                    container = %container.name,
                    "Skipping container, secret automount does not apply"
                );
                return None;
            }
            Some(MountTarget {
                pod: pod_name.to_string(),
                container: idx,
                component: component.cloned(),
            })
        })
        .collect()
}

pub(crate) fn mount_targets(workload: &WorkloadModel, secret: &Secret) -> Vec<MountTarget> {
    deployment_pods(workload)
        .iter()
        .flat_map(|pod| mount_targets_in_pod(workload, pod, secret))
        .collect()
}
