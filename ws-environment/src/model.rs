// External crate imports
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

// Internal imports
use ws_core::workload::machine_name;
use ws_core::{Container, EnvVar, PodData, PodRole, WorkloadModel};

/// Installer id marking the machine that runs the workspace agent.
pub const WS_AGENT_INSTALLER: &str = "org.eclipse.che.ws-agent";
/// Server reference marking the machine that runs the workspace agent.
pub const WS_AGENT_SERVER: &str = "wsagent/http";
/// Machine attribute overriding the container memory limit, in bytes.
pub const MEMORY_LIMIT_ATTRIBUTE: &str = "memoryLimitBytes";
/// Server attribute copied into the `.path` server label.
pub const SERVER_PATH_ATTRIBUTE: &str = "path";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub recipe_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Recipe {
    pub fn new(recipe_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            recipe_type: Some(recipe_type.into()),
            content_type: None,
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// `port` or `port/transport`, e.g. `8080` or `8080/udp`.
    pub port: String,
    /// Application protocol such as `http`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
}

impl ServerConfig {
    pub fn new(port: impl Into<String>, protocol: Option<&str>) -> Self {
        Self {
            port: port.into(),
            protocol: protocol.map(str::to_string),
            attributes: IndexMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn path(&self) -> Option<&str> {
        self.attributes.get(SERVER_PATH_ATTRIBUTE).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    #[serde(default)]
    pub installers: Vec<String>,
    #[serde(default)]
    pub servers: IndexMap<String, ServerConfig>,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
}

impl MachineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_installer(mut self, installer: impl Into<String>) -> Self {
        self.installers.push(installer.into());
        self
    }

    pub fn with_server(mut self, name: impl Into<String>, server: ServerConfig) -> Self {
        self.servers.insert(name.into(), server);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn is_ws_agent(&self) -> bool {
        self.installers.iter().any(|i| i == WS_AGENT_INSTALLER)
            || self.servers.contains_key(WS_AGENT_SERVER)
    }
}

/// A workspace environment as declared by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Recipe>,
    #[serde(default)]
    pub machines: IndexMap<String, MachineConfig>,
}

impl Environment {
    pub fn new(recipe: Recipe) -> Self {
        Self {
            recipe: Some(recipe),
            machines: IndexMap::new(),
        }
    }

    pub fn with_machine(mut self, name: impl Into<String>, machine: MachineConfig) -> Self {
        self.machines.insert(name.into(), machine);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,
    /// Inline Dockerfile, used when the recipe itself is a Dockerfile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dockerfile_content: Option<String>,
}

/// A concrete container definition produced by a recipe parser.
///
/// Field names follow the compose file format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildContext>,
    #[serde(default, deserialize_with = "string_or_number_list")]
    pub expose: Vec<String>,
    #[serde(default)]
    pub labels: IndexMap<String, String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub volumes_from: Vec<String>,
    #[serde(default, deserialize_with = "string_or_number_list")]
    pub ports: Vec<String>,
    #[serde(default)]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub networks: Vec<String>,
    #[serde(default)]
    pub environment: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_limit: Option<u64>,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub entrypoint: Vec<String>,
}

impl ContainerConfig {
    pub fn from_image(image: impl Into<String>) -> Self {
        Self {
            image: Some(image.into()),
            ..Default::default()
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(u64),
}

// Compose files commonly list ports as bare numbers.
fn string_or_number_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<StringOrNumber>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(|v| match v {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        })
        .collect())
}

/// Output of parsing: containers keyed by machine name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerEnvironment {
    #[serde(default)]
    pub containers: IndexMap<String, ContainerConfig>,
}

impl ContainerEnvironment {
    pub fn with_container(mut self, name: impl Into<String>, container: ContainerConfig) -> Self {
        self.containers.insert(name.into(), container);
        self
    }

    /// Places every container into one deployment pod named `pod_name`.
    ///
    /// Machine attributes are carried over so the secret appliers can resolve
    /// devfile components by machine name (`{pod}/{container}`).
    pub fn to_workload(&self, pod_name: &str, environment: &Environment) -> WorkloadModel {
        let mut pod = PodData::new(PodRole::Deployment);
        let mut workload = WorkloadModel::new();

        for (name, config) in &self.containers {
            let mut container = Container::new(name.as_str());
            container.image = config.image.clone();
            container.env = config
                .environment
                .iter()
                .map(|(k, v)| EnvVar::literal(k.as_str(), v.as_str()))
                .collect();
            pod.containers.push(container);

            if let Some(machine) = environment.machines.get(name) {
                workload.machines.insert(
                    machine_name(pod_name, name),
                    ws_core::MachineConfig {
                        attributes: machine.attributes.clone(),
                    },
                );
            }
        }

        workload.pods.insert(pod_name.to_string(), pod);
        workload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml_ng as serde_yaml;

    #[test]
    fn test_ws_agent_detection() {
        assert!(MachineConfig::new()
            .with_installer(WS_AGENT_INSTALLER)
            .is_ws_agent());
        assert!(MachineConfig::new()
            .with_server(WS_AGENT_SERVER, ServerConfig::new("4401/tcp", Some("http")))
            .is_ws_agent());
        assert!(!MachineConfig::new()
            .with_installer("org.eclipse.che.terminal")
            .is_ws_agent());
    }

    #[test]
    fn test_container_ports_accept_numbers() -> anyhow::Result<()> {
        let config: ContainerConfig =
            serde_yaml::from_str("image: busybox\nexpose:\n  - 8080\n  - \"9090/udp\"\n")?;
        assert_eq!(config.expose, vec!["8080", "9090/udp"]);
        Ok(())
    }

    #[test]
    fn test_to_workload_carries_machine_attributes() {
        let environment = Environment::new(Recipe::new("dockerimage", "eclipse/ubuntu_jdk8"))
            .with_machine("dev", MachineConfig::new().with_attribute("component", "java"));
        let containers = ContainerEnvironment::default().with_container(
            "dev",
            ContainerConfig {
                environment: [("JAVA_OPTS".to_string(), "-Xmx1g".to_string())]
                    .into_iter()
                    .collect(),
                ..ContainerConfig::from_image("eclipse/ubuntu_jdk8")
            },
        );

        let workload = containers.to_workload("workspace", &environment);

        let pod = &workload.pods["workspace"];
        assert_eq!(pod.role, PodRole::Deployment);
        assert_eq!(pod.containers[0].image.as_deref(), Some("eclipse/ubuntu_jdk8"));
        assert_eq!(pod.containers[0].env, vec![EnvVar::literal("JAVA_OPTS", "-Xmx1g")]);
        assert_eq!(
            workload.machines["workspace/dev"].attributes["component"],
            "java"
        );
    }
}
