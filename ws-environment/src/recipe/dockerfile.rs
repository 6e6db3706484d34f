use ws_core::Result;

use super::{recipe_content, single_machine, RecipeParser, DOCKERFILE_TYPE};
use crate::model::{BuildContext, ContainerConfig, ContainerEnvironment, Environment};

/// The recipe content is a Dockerfile, built for the environment's only machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerfileParser;

impl RecipeParser for DockerfileParser {
    fn parse(&self, environment: &Environment) -> Result<ContainerEnvironment> {
        let machine = single_machine(environment, DOCKERFILE_TYPE)?;
        let container = ContainerConfig {
            build: Some(BuildContext {
                dockerfile_content: Some(recipe_content(environment)?.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        Ok(ContainerEnvironment::default().with_container(machine, container))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MachineConfig, Recipe};

    #[test]
    fn test_dockerfile_becomes_build_context() -> anyhow::Result<()> {
        let dockerfile = "FROM eclipse/ubuntu_jdk8\nRUN apt-get update\n";
        let environment = Environment::new(Recipe::new("dockerfile", dockerfile))
            .with_machine("dev-machine", MachineConfig::new());

        let parsed = DockerfileParser.parse(&environment)?;

        let container = &parsed.containers["dev-machine"];
        assert!(container.image.is_none());
        assert_eq!(
            container
                .build
                .as_ref()
                .and_then(|b| b.dockerfile_content.as_deref()),
            Some(dockerfile)
        );
        Ok(())
    }
}
