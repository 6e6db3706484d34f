pub mod config;
pub mod error;
pub mod identity;
pub mod platform;
pub mod runtime;
pub mod secret;
pub mod workload;

pub use config::InfrastructureConfig;
pub use error::{ErrorKind, Result, WorkspaceError};
pub use identity::RuntimeIdentity;
pub use platform::PlatformVersion;
pub use runtime::{
    Command, MachineState, MachineStatus, RuntimeState, ServerState, ServerStatus,
    WorkspaceStatus,
};
pub use secret::{ConfigMap, Secret};
pub use workload::{
    Component, ComponentVolume, Container, EnvValue, EnvVar, MachineConfig, PodData, PodRole,
    Volume, VolumeMount, VolumeSource, WorkloadModel,
};
