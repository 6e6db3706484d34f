// Standard library imports
use std::fmt;

// External crate imports
use indexmap::IndexMap;
use tracing::instrument;

// Internal imports
use ws_core::{Result, WorkspaceError};

use crate::model::{
    ContainerConfig, ContainerEnvironment, Environment, MachineConfig, MEMORY_LIMIT_ATTRIBUTE,
};
use crate::recipe::{
    ComposeParser, DockerImageParser, DockerfileParser, RecipeParser, COMPOSE_TYPE,
    DOCKERFILE_TYPE, DOCKERIMAGE_TYPE,
};

pub const SERVER_LABEL_PREFIX: &str = "org.eclipse.che.server.";
pub const SERVER_LABEL_REF_SUFFIX: &str = ".ref";
pub const SERVER_LABEL_PROTOCOL_SUFFIX: &str = ".protocol";
pub const SERVER_LABEL_PATH_SUFFIX: &str = ".path";

const DEFAULT_TRANSPORT: &str = "tcp";

/// Recipe parsers keyed by recipe type.
#[derive(Default)]
pub struct ParserRegistry {
    parsers: IndexMap<String, Box<dyn RecipeParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `compose`, `dockerimage` and `dockerfile` parsers.
    pub fn with_defaults() -> Self {
        Self::new()
            .with_parser(COMPOSE_TYPE, ComposeParser)
            .with_parser(DOCKERIMAGE_TYPE, DockerImageParser)
            .with_parser(DOCKERFILE_TYPE, DockerfileParser)
    }

    pub fn with_parser(
        mut self,
        recipe_type: impl Into<String>,
        parser: impl RecipeParser + 'static,
    ) -> Self {
        self.parsers.insert(recipe_type.into(), Box::new(parser));
        self
    }

    pub fn get(&self, recipe_type: &str) -> Option<&dyn RecipeParser> {
        self.parsers.get(recipe_type).map(|p| p.as_ref())
    }

    pub fn types(&self) -> Vec<&str> {
        self.parsers.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("types", &self.types())
            .finish()
    }
}

#[derive(Debug)]
pub struct EnvironmentParser {
    registry: ParserRegistry,
}

impl EnvironmentParser {
    pub fn new(registry: ParserRegistry) -> Self {
        Self { registry }
    }

    pub fn supported_types(&self) -> Vec<&str> {
        self.registry.types()
    }

    /// Parses the recipe and merges each machine's servers and attributes into
    /// its container.
    #[instrument(skip_all)]
    pub fn parse(&self, environment: Option<&Environment>) -> Result<ContainerEnvironment> {
        let environment = environment.ok_or_else(|| config_error("Environment should not be null"))?;
        let recipe = environment
            .recipe
            .as_ref()
            .ok_or_else(|| config_error("Environment recipe should not be null"))?;
        let recipe_type = recipe
            .recipe_type
            .as_deref()
            .ok_or_else(|| config_error("Environment recipe type should not be null"))?;
        if recipe.content.as_deref().map_or(true, |c| c.trim().is_empty()) {
            return Err(config_error("Environment recipe content should not be empty"));
        }

        let parser = self.registry.get(recipe_type).ok_or_else(|| {
            WorkspaceError::Configuration(format!(
                "Environment type '{}' is not supported. Supported environment types: {}",
                recipe_type,
                self.supported_types().join(", ")
            ))
        })?;

        let mut parsed = parser.parse(environment)?;

        for (machine_name, machine) in &environment.machines {
            let Some(container) = parsed.containers.get_mut(machine_name) else {
                continue;
            };
            apply_servers(machine, container);
            apply_memory_limit(machine_name, machine, container)?;
        }

        tracing::debug!(
            recipe_type,
            containers = parsed.containers.len(),
            "Parsed environment"
        );
        Ok(parsed)
    }
}

fn config_error(message: &str) -> WorkspaceError {
    WorkspaceError::Configuration(message.to_string())
}

fn split_port(port: &str) -> (&str, Option<&str>) {
    match port.split_once('/') {
        Some((number, transport)) => (number, Some(transport)),
        None => (port, None),
    }
}

/// `port/transport` for a server, taking the transport from an explicit expose
/// entry with the same port number when the server has none.
fn normalize_server_port(port: &str, expose: &[String]) -> String {
    let (number, transport) = split_port(port.trim());
    if let Some(transport) = transport {
        return format!("{}/{}", number, transport);
    }
    let transport = expose
        .iter()
        .filter_map(|e| match split_port(e.trim()) {
            (n, Some(t)) if n == number => Some(t),
            _ => None,
        })
        .next()
        .unwrap_or(DEFAULT_TRANSPORT);
    format!("{}/{}", number, transport)
}

fn apply_servers(machine: &MachineConfig, container: &mut ContainerConfig) {
    let mut server_ports = Vec::with_capacity(machine.servers.len());

    for (reference, server) in &machine.servers {
        let port = normalize_server_port(&server.port, &container.expose);
        let label = |suffix: &str| format!("{}{}{}", SERVER_LABEL_PREFIX, port, suffix);

        container
            .labels
            .insert(label(SERVER_LABEL_REF_SUFFIX), reference.clone());
        if let Some(protocol) = &server.protocol {
            container
                .labels
                .insert(label(SERVER_LABEL_PROTOCOL_SUFFIX), protocol.clone());
        }
        if let Some(path) = server.path() {
            container
                .labels
                .insert(label(SERVER_LABEL_PATH_SUFFIX), path.to_string());
        }
        server_ports.push(port);
    }

    let mut expose: Vec<String> = Vec::with_capacity(container.expose.len() + server_ports.len());
    for entry in &container.expose {
        let (number, transport) = split_port(entry.trim());
        let normalized = match transport {
            Some(t) => format!("{}/{}", number, t),
            None => server_ports
                .iter()
                .find(|p| split_port(p).0 == number)
                .cloned()
                .unwrap_or_else(|| format!("{}/{}", number, DEFAULT_TRANSPORT)),
        };
        if !expose.contains(&normalized) {
            expose.push(normalized);
        }
    }
    for port in server_ports {
        if !expose.contains(&port) {
            expose.push(port);
        }
    }
    container.expose = expose;
}

fn apply_memory_limit(
    machine_name: &str,
    machine: &MachineConfig,
    container: &mut ContainerConfig,
) -> Result<()> {
    let Some(value) = machine.attributes.get(MEMORY_LIMIT_ATTRIBUTE) else {
        return Ok(());
    };
    let bytes = value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|b| *b > 0)
        .ok_or_else(|| {
            WorkspaceError::Configuration(format!(
                "Value of attribute '{}' of machine '{}' is illegal",
                MEMORY_LIMIT_ATTRIBUTE, machine_name
            ))
        })?;
    container.mem_limit = Some(bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Recipe, ServerConfig};
    use ws_core::ErrorKind;

    fn parser() -> EnvironmentParser {
        EnvironmentParser::new(ParserRegistry::with_defaults())
    }

    fn image_env(server: ServerConfig) -> Environment {
        Environment::new(Recipe::new("dockerimage", "eclipse/ubuntu_jdk8"))
            .with_machine("dev-machine", MachineConfig::new().with_server("ref1", server))
    }

    #[test]
    fn test_preconditions_each_have_distinct_errors() {
        let parser = parser();
        let no_recipe = Environment::default();
        let no_type = Environment::new(Recipe {
            content: Some("busybox".into()),
            ..Default::default()
        });
        let no_content = Environment::new(Recipe {
            recipe_type: Some("dockerimage".into()),
            ..Default::default()
        });

        let messages: Vec<String> = [None, Some(&no_recipe), Some(&no_type), Some(&no_content)]
            .into_iter()
            .map(|env| parser.parse(env).unwrap_err().message())
            .collect();

        assert_eq!(
            messages,
            vec![
                "Environment should not be null",
                "Environment recipe should not be null",
                "Environment recipe type should not be null",
                "Environment recipe content should not be empty",
            ]
        );
    }

    #[test]
    fn test_unknown_type_lists_supported_types() {
        let environment = Environment::new(Recipe::new("kubernetes", "kind: Pod"));
        let err = parser().parse(Some(&environment)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(
            err.message(),
            "Environment type 'kubernetes' is not supported. Supported environment types: compose, dockerimage, dockerfile"
        );
    }

    #[test]
    fn test_server_labels() -> anyhow::Result<()> {
        let environment = image_env(
            ServerConfig::new("8080", Some("https")).with_attribute("path", "/some/path"),
        );
        let parsed = parser().parse(Some(&environment))?;

        let labels = &parsed.containers["dev-machine"].labels;
        assert_eq!(labels["org.eclipse.che.server.8080/tcp.ref"], "ref1");
        assert_eq!(labels["org.eclipse.che.server.8080/tcp.protocol"], "https");
        assert_eq!(labels["org.eclipse.che.server.8080/tcp.path"], "/some/path");
        Ok(())
    }

    #[test]
    fn test_server_without_protocol_or_path_only_gets_ref_label() -> anyhow::Result<()> {
        let environment = image_env(ServerConfig::new("8080/udp", None).with_attribute("some", "value"));
        let parsed = parser().parse(Some(&environment))?;

        let container = &parsed.containers["dev-machine"];
        assert_eq!(container.expose, vec!["8080/udp"]);
        assert_eq!(container.labels.len(), 1);
        assert_eq!(container.labels["org.eclipse.che.server.8080/udp.ref"], "ref1");
        Ok(())
    }

    #[test]
    fn test_compose_expose_normalization() -> anyhow::Result<()> {
        let compose = r#"
services:
  dev-machine:
    image: eclipse/ubuntu_jdk8
    expose: ["9090/tcp", "9090/udp", "7070", "7070/udp", "9090/tcp"]
"#;
        let environment = Environment::new(Recipe::new("compose", compose)).with_machine(
            "dev-machine",
            MachineConfig::new()
                .with_server("ref1", ServerConfig::new("8080", Some("https")))
                .with_server("ref2", ServerConfig::new("8080/udp", Some("http"))),
        );

        let parsed = parser().parse(Some(&environment))?;

        assert_eq!(
            parsed.containers["dev-machine"].expose,
            vec!["9090/tcp", "9090/udp", "7070/tcp", "7070/udp", "8080/tcp", "8080/udp"]
        );
        Ok(())
    }

    #[test]
    fn test_bare_expose_adopts_server_transport() -> anyhow::Result<()> {
        let compose = "services:\n  dev:\n    image: busybox\n    expose: [\"5005\"]\n";
        let environment = Environment::new(Recipe::new("compose", compose)).with_machine(
            "dev",
            MachineConfig::new().with_server("debug", ServerConfig::new("5005/udp", None)),
        );

        let parsed = parser().parse(Some(&environment))?;

        assert_eq!(parsed.containers["dev"].expose, vec!["5005/udp"]);
        Ok(())
    }

    #[test]
    fn test_memory_limit_attribute() -> anyhow::Result<()> {
        let environment = Environment::new(Recipe::new("dockerimage", "busybox")).with_machine(
            "machine1",
            MachineConfig::new().with_attribute(MEMORY_LIMIT_ATTRIBUTE, "101010"),
        );
        let parsed = parser().parse(Some(&environment))?;
        assert_eq!(parsed.containers["machine1"].mem_limit, Some(101010));

        let invalid = Environment::new(Recipe::new("dockerimage", "busybox")).with_machine(
            "machine1",
            MachineConfig::new().with_attribute(MEMORY_LIMIT_ATTRIBUTE, "10M"),
        );
        let err = parser().parse(Some(&invalid)).unwrap_err();
        assert_eq!(
            err.message(),
            "Value of attribute 'memoryLimitBytes' of machine 'machine1' is illegal"
        );
        Ok(())
    }

    #[test]
    fn test_custom_parser_registration() -> anyhow::Result<()> {
        struct Fixed;
        impl RecipeParser for Fixed {
            fn parse(&self, _environment: &Environment) -> Result<ContainerEnvironment> {
                Ok(ContainerEnvironment::default()
                    .with_container("only", ContainerConfig::from_image("fixed")))
            }
        }

        let parser = EnvironmentParser::new(ParserRegistry::new().with_parser("fixed", Fixed));
        let parsed = parser.parse(Some(&Environment::new(Recipe::new("fixed", "anything"))))?;

        assert_eq!(parser.supported_types(), vec!["fixed"]);
        assert_eq!(parsed.containers["only"].image.as_deref(), Some("fixed"));
        Ok(())
    }
}
