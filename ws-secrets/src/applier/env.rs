use tracing::warn;

use ws_core::{EnvVar, Result, RuntimeIdentity, Secret, WorkloadModel, WorkspaceError};

use super::{mount_targets, SecretApplier};
use crate::annotations::{env_name_annotation, ENV_NAME};

/// Exposes every data entry of a secret as an environment variable bound to
/// the secret key, in each qualifying container.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretApplier;

impl EnvSecretApplier {
    pub fn new() -> Self {
        Self
    }

    /// Variable names for all data entries. Fails before anything is mounted.
    fn env_vars(&self, secret: &Secret) -> Result<Vec<EnvVar>> {
        let single = secret.data.len() == 1;
        secret
            .data
            .keys()
            .map(|key| -> Result<EnvVar> {
                let name = if single {
                    single_entry_name(secret, key)?
                } else {
                    secret
                        .annotation(&env_name_annotation(key))
                        .ok_or_else(|| {
                            WorkspaceError::Configuration(format!(
                                "Unable to mount key '{}'  of secret '{}': It is configured to be mount as a environment variable, but its name was not specified. Please define the '{}' annotation on the secret to specify it.",
                                key,
                                secret.name,
                                env_name_annotation(key)
                            ))
                        })?
                        .to_string()
                };
                Ok(EnvVar::from_secret(name, &secret.name, key))
            })
            .collect()
    }
}

fn single_entry_name(secret: &Secret, key: &str) -> Result<String> {
    let plain = secret.annotation(ENV_NAME);
    let templated = secret.annotation(&env_name_annotation(key));

    match (plain, templated) {
        (Some(plain), Some(_)) => {
            warn!(
                secret = %secret.name,
                "Secret has both '{}' and '{}' annotations, using '{}'",
                ENV_NAME,
                env_name_annotation(key),
                ENV_NAME
            );
            Ok(plain.to_string())
        }
        (Some(name), None) | (None, Some(name)) => Ok(name.to_string()),
        (None, None) => Err(WorkspaceError::Configuration(format!(
            "Unable to mount secret '{}': It is configured to be mount as a environment variable, but its name was not specified. Please define the '{}' annotation on the secret to specify it.",
            secret.name, ENV_NAME
        ))),
    }
}

impl SecretApplier for EnvSecretApplier {
    fn apply_secret(
        &self,
        workload: &mut WorkloadModel,
        identity: &RuntimeIdentity,
        secret: &Secret,
    ) -> Result<()> {
        let vars = self.env_vars(secret)?;

        for target in mount_targets(workload, secret) {
            if let Some(container) = workload
                .pods
                .get_mut(&target.pod)
                .and_then(|pod| pod.containers.get_mut(target.container))
            {
                tracing::debug!(
                    workspace_id = %identity.workspace_id(),
                    secret = %secret.name,
                    container = %container.name,
                    "Mounting secret as environment variables"
                );
                container.env.extend(vars.iter().cloned());
            }
        }
        Ok(())
    }
}
