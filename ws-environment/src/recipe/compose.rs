use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml_ng as serde_yaml;

use ws_core::{Result, WorkspaceError};

use super::{recipe_content, RecipeParser};
use crate::model::{ContainerConfig, ContainerEnvironment, Environment};

#[derive(Debug, Deserialize)]
struct ComposeFile {
    #[serde(default)]
    services: IndexMap<String, ContainerConfig>,
}

/// Parses a compose YAML document; every service becomes a container.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeParser;

impl RecipeParser for ComposeParser {
    fn parse(&self, environment: &Environment) -> Result<ContainerEnvironment> {
        let content = recipe_content(environment)?;
        let compose: ComposeFile = serde_yaml::from_str(content).map_err(|e| {
            WorkspaceError::Configuration(format!("Parsing of environment configuration failed. {}", e))
        })?;
        tracing::debug!("Parsed compose recipe with {} services", compose.services.len());
        Ok(ContainerEnvironment {
            containers: compose.services,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Recipe;

    const COMPOSE: &str = r#"
version: "2"
services:
  db:
    image: postgres:15
    expose:
      - 5432
  dev-machine:
    image: eclipse/ubuntu_jdk8
    mem_limit: 2147483648
    depends_on:
      - db
    environment:
      DB_HOST: db
"#;

    #[test]
    fn test_parse_services_in_order() -> anyhow::Result<()> {
        let environment = Environment::new(Recipe::new("compose", COMPOSE));
        let parsed = ComposeParser.parse(&environment)?;

        let names: Vec<&str> = parsed.containers.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["db", "dev-machine"]);
        assert_eq!(parsed.containers["db"].expose, vec!["5432"]);
        let dev = &parsed.containers["dev-machine"];
        assert_eq!(dev.mem_limit, Some(2_147_483_648));
        assert_eq!(dev.depends_on, vec!["db"]);
        assert_eq!(dev.environment["DB_HOST"], "db");
        Ok(())
    }

    #[test]
    fn test_malformed_compose_is_configuration_error() {
        let environment = Environment::new(Recipe::new("compose", "services: [unclosed"));
        let err = ComposeParser.parse(&environment).unwrap_err();
        assert_eq!(err.kind(), ws_core::ErrorKind::Configuration);
        assert!(err.message().starts_with("Parsing of environment configuration failed."));
    }
}
