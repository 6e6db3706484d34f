use ws_core::{
    Container, InfrastructureConfig, PlatformVersion, Result, RuntimeIdentity, Secret, Volume,
    VolumeMount, WorkloadModel, WorkspaceError,
};

use super::{deployment_pods, mount_targets_in_pod, SecretApplier};
use crate::annotations::MOUNT_PATH;
use crate::naming::unique_volume_name;

const DEFAULT_SUFFIX_LENGTH: usize = 6;

/// Mounts the data entries of a secret as read-only files.
///
/// Every deployment pod gets one secret volume. On platforms from 1.13 on each
/// key is mounted at `{path}/{key}` through a sub-path. Older platforms cannot
/// do that, so the whole volume is mounted at `{path}` and any other mount at
/// that path is dropped.
#[derive(Debug, Clone)]
pub struct FileSecretApplier {
    platform_version: PlatformVersion,
    suffix_length: usize,
    component_paths: bool,
}

impl FileSecretApplier {
    pub fn new(config: &InfrastructureConfig) -> Result<Self> {
        Ok(Self {
            platform_version: config.platform_version()?,
            suffix_length: config.volume_suffix_length,
            component_paths: true,
        })
    }

    pub fn with_platform_version(platform_version: PlatformVersion) -> Self {
        Self {
            platform_version,
            suffix_length: DEFAULT_SUFFIX_LENGTH,
            component_paths: true,
        }
    }

    /// Always mounts at the `mount-path` annotation, ignoring component volume
    /// overrides, so every container sees the files at the same location.
    pub fn without_component_paths(mut self) -> Self {
        self.component_paths = false;
        self
    }

    pub fn platform_version(&self) -> PlatformVersion {
        self.platform_version
    }

    fn supports_sub_paths(&self) -> bool {
        self.platform_version.newer_or_equal_than(1, 13)
    }

    fn mount_into(&self, container: &mut Container, volume_name: &str, path: &str, secret: &Secret) {
        if self.supports_sub_paths() {
            for key in secret.data.keys() {
                let mount_path = join_path(path, key);
                container.volume_mounts.retain(|m| m.mount_path != mount_path);
                container.volume_mounts.push(VolumeMount {
                    name: volume_name.to_string(),
                    mount_path,
                    sub_path: Some(key.clone()),
                    read_only: true,
                });
            }
        } else {
            container.volume_mounts.retain(|m| m.mount_path != path);
            container.volume_mounts.push(VolumeMount {
                name: volume_name.to_string(),
                mount_path: path.to_string(),
                sub_path: None,
                read_only: true,
            });
        }
    }
}

pub(crate) fn required_mount_path(secret: &Secret) -> Result<&str> {
    secret.annotation(MOUNT_PATH).ok_or_else(|| {
        WorkspaceError::Configuration(format!(
            "Unable to mount secret '{}': It is configured to be mounted as a file but the mount path was not specified. Please define the '{}' annotation on the secret to specify it.",
            secret.name, MOUNT_PATH
        ))
    })
}

pub(crate) fn join_path(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

impl SecretApplier for FileSecretApplier {
    fn apply_secret(
        &self,
        workload: &mut WorkloadModel,
        identity: &RuntimeIdentity,
        secret: &Secret,
    ) -> Result<()> {
        let base_path = required_mount_path(secret)?;

        for pod_name in deployment_pods(workload) {
            let targets = mount_targets_in_pod(workload, &pod_name, secret);
            let Some(pod) = workload.pods.get_mut(&pod_name) else {
                continue;
            };

            let volume_name = unique_volume_name(pod, &secret.name, self.suffix_length);
            pod.volumes.push(Volume::secret(&volume_name, &secret.name));

            for target in targets {
                let path = target
                    .component
                    .as_ref()
                    .filter(|_| self.component_paths)
                    .and_then(|c| c.volume_path(&secret.name))
                    .unwrap_or(base_path);
                let Some(container) = pod.containers.get_mut(target.container) else {
                    continue;
                };
                tracing::debug!(
                    workspace_id = %identity.workspace_id(),
                    secret = %secret.name,
                    container = %container.name,
                    path,
                    "Mounting secret as files"
                );
                self.mount_into(container, &volume_name, path, secret);
            }
        }
        Ok(())
    }
}
