//! In-memory description of a workspace's container workload.
//!
//! The model is built fresh for every provisioning pass, mutated by the
//! secret appliers and finally handed to the platform. Nothing here is
//! persisted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::secret::ConfigMap;

/// Machine attribute naming the devfile component a container was created from.
pub const COMPONENT_ALIAS_ATTRIBUTE: &str = "component";

/// Returns the machine name of a container, `{pod}/{container}`.
pub fn machine_name(pod_name: &str, container_name: &str) -> String {
    format!("{}/{}", pod_name, container_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PodRole {
    /// Long-running workspace pods. Secrets are only applied to these.
    #[default]
    Deployment,
    /// One-shot pods such as init jobs.
    Injectable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnvValue {
    Literal(String),
    SecretKeyRef { name: String, key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: EnvValue,
}

impl EnvVar {
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: EnvValue::Literal(value.into()),
        }
    }

    pub fn from_secret(
        name: impl Into<String>,
        secret_name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: EnvValue::SecretKeyRef {
                name: secret_name.into(),
                key: key.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
    #[serde(default)]
    pub read_only: bool,
}

impl VolumeMount {
    pub fn new(name: impl Into<String>, mount_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mount_path: mount_path.into(),
            sub_path: None,
            read_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VolumeSource {
    Secret { secret_name: String },
    ConfigMap { name: String },
    EmptyDir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    pub source: VolumeSource,
}

impl Volume {
    pub fn secret(name: impl Into<String>, secret_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: VolumeSource::Secret {
                secret_name: secret_name.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub volume_mounts: Vec<VolumeMount>,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_volume_mount(mut self, mount: VolumeMount) -> Self {
        self.volume_mounts.push(mount);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodData {
    #[serde(default)]
    pub role: PodRole,
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
}

impl PodData {
    pub fn new(role: PodRole) -> Self {
        Self {
            role,
            ..Default::default()
        }
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.containers.push(container);
        self
    }

    pub fn with_volume(mut self, volume: Volume) -> Self {
        self.volumes.push(volume);
        self
    }

    pub fn has_volume(&self, name: &str) -> bool {
        self.volumes.iter().any(|v| v.name == name)
    }
}

/// Per-machine configuration carried along with the workload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
}

impl MachineConfig {
    pub fn for_component(alias: impl Into<String>) -> Self {
        let mut attributes = IndexMap::new();
        attributes.insert(COMPONENT_ALIAS_ATTRIBUTE.to_string(), alias.into());
        Self { attributes }
    }
}

/// A devfile volume entry that overrides where a named secret is mounted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentVolume {
    pub name: String,
    pub container_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// `Some(true)` forces automount, `Some(false)` always opts out, `None` defers to the secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automount_workspace_secrets: Option<bool>,
    #[serde(default)]
    pub volumes: Vec<ComponentVolume>,
}

impl Component {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..Default::default()
        }
    }

    pub fn with_automount(mut self, automount: bool) -> Self {
        self.automount_workspace_secrets = Some(automount);
        self
    }

    pub fn with_volume(mut self, name: impl Into<String>, container_path: impl Into<String>) -> Self {
        self.volumes.push(ComponentVolume {
            name: name.into(),
            container_path: container_path.into(),
        });
        self
    }

    /// Mount path override declared by this component for the named volume.
    pub fn volume_path(&self, volume_name: &str) -> Option<&str> {
        self.volumes
            .iter()
            .find(|v| v.name == volume_name)
            .map(|v| v.container_path.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadModel {
    #[serde(default)]
    pub pods: IndexMap<String, PodData>,
    #[serde(default)]
    pub machines: IndexMap<String, MachineConfig>,
    #[serde(default)]
    pub config_maps: IndexMap<String, ConfigMap>,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl WorkloadModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pod(mut self, name: impl Into<String>, pod: PodData) -> Self {
        self.pods.insert(name.into(), pod);
        self
    }

    pub fn with_machine(mut self, name: impl Into<String>, machine: MachineConfig) -> Self {
        self.machines.insert(name.into(), machine);
        self
    }

    pub fn with_config_map(mut self, config_map: ConfigMap) -> Self {
        self.config_maps.insert(config_map.name.clone(), config_map);
        self
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    /// Devfile component a container belongs to, resolved through its machine attributes.
    pub fn component_for(&self, pod_name: &str, container_name: &str) -> Option<&Component> {
        let alias = self
            .machines
            .get(&machine_name(pod_name, container_name))?
            .attributes
            .get(COMPONENT_ALIAS_ATTRIBUTE)?;
        self.components
            .iter()
            .find(|c| c.alias.as_deref() == Some(alias.as_str()))
    }

    pub fn to_yaml(&self) -> crate::Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload_with_component() -> WorkloadModel {
        WorkloadModel::new()
            .with_pod(
                "pod1",
                PodData::new(PodRole::Deployment).with_container(Container::new("maven")),
            )
            .with_machine("pod1/maven", MachineConfig::for_component("maven"))
            .with_component(Component::new("maven").with_volume("m2", "/root/.m2"))
    }

    #[test]
    fn test_component_for_resolves_through_machine_attributes() {
        let workload = workload_with_component();
        let component = workload.component_for("pod1", "maven");
        assert_eq!(component.and_then(|c| c.alias.as_deref()), Some("maven"));
        assert_eq!(component.and_then(|c| c.volume_path("m2")), Some("/root/.m2"));
    }

    #[test]
    fn test_component_for_unknown_container() {
        let workload = workload_with_component();
        assert!(workload.component_for("pod1", "other").is_none());
        assert!(workload.component_for("pod2", "maven").is_none());
    }

    #[test]
    fn test_yaml_rendering_includes_pods() -> anyhow::Result<()> {
        let yaml = workload_with_component().to_yaml()?;
        assert!(yaml.contains("pod1"));
        assert!(yaml.contains("deployment"));
        Ok(())
    }
}
