// External crate imports
use tracing::{info, instrument};

// Internal imports
use ws_core::{InfrastructureConfig, Result, RuntimeIdentity, Secret, WorkloadModel};

use crate::applier::{
    EnvSecretApplier, FileSecretApplier, GitCredentialSecretApplier, SecretApplier,
};
use crate::mount::MountMode;
use crate::selector::LabelSelector;

/// Access to the secrets of a workspace namespace.
///
/// Implemented by the platform client; listing may block on I/O.
pub trait NamespaceSecrets {
    fn list_by_label_selector(&self, selector: &LabelSelector) -> Result<Vec<Secret>>;
}

/// Discovers labelled secrets and hands each one to the applier its
/// annotations ask for.
#[derive(Debug, Clone)]
pub struct SecretProvisioner {
    selector: LabelSelector,
    env_applier: EnvSecretApplier,
    file_applier: FileSecretApplier,
    git_credential_applier: GitCredentialSecretApplier,
}

impl SecretProvisioner {
    pub fn new(config: &InfrastructureConfig) -> Result<Self> {
        Ok(Self {
            selector: LabelSelector::parse(&config.secret_labels)?,
            env_applier: EnvSecretApplier::new(),
            file_applier: FileSecretApplier::new(config)?,
            git_credential_applier: GitCredentialSecretApplier::new(config)?,
        })
    }

    pub fn selector(&self) -> &LabelSelector {
        &self.selector
    }

    fn applier_for(&self, mode: MountMode) -> &dyn SecretApplier {
        match mode {
            MountMode::Env => &self.env_applier,
            MountMode::File {
                git_credential: true,
            } => &self.git_credential_applier,
            MountMode::File {
                git_credential: false,
            } => &self.file_applier,
        }
    }

    /// Applies every matching secret to the workload, stopping at the first error.
    ///
    /// The workload may already be partially modified when an error is returned;
    /// callers discard it in that case.
    #[instrument(skip_all, fields(workspace_id = %identity.workspace_id()))]
    pub fn provision(
        &self,
        workload: &mut WorkloadModel,
        identity: &RuntimeIdentity,
        namespace: &dyn NamespaceSecrets,
    ) -> Result<()> {
        let secrets = namespace.list_by_label_selector(&self.selector)?;
        tracing::debug!(
            "Found {} secrets matching '{}'",
            secrets.len(),
            self.selector
        );

        for secret in &secrets {
            let mode = MountMode::resolve(secret)?;
            self.applier_for(mode)
                .apply_secret(workload, identity, secret)?;
        }

        if !secrets.is_empty() {
            info!("Provisioned {} secrets", secrets.len());
        }
        Ok(())
    }
}
