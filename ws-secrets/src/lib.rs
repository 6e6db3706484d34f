//! Secret provisioning for workspace workloads.
//!
//! Secrets labelled for workspace use are discovered in the workspace namespace
//! and injected into the deployment pods of a [`ws_core::WorkloadModel`], either
//! as environment variables or as read-only files. Annotations on each secret
//! decide how (see [`annotations`]).

pub mod annotations;
pub mod applier;
pub mod mount;
pub mod naming;
pub mod provisioner;
pub mod selector;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use applier::{EnvSecretApplier, FileSecretApplier, GitCredentialSecretApplier, SecretApplier};
pub use mount::MountMode;
pub use provisioner::{NamespaceSecrets, SecretProvisioner};
pub use selector::LabelSelector;
pub use ws_core::{Result, WorkspaceError};
