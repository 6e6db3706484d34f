use ws_core::Result;

use super::{recipe_content, single_machine, RecipeParser, DOCKERIMAGE_TYPE};
use crate::model::{ContainerConfig, ContainerEnvironment, Environment};

/// The recipe content is an image reference for the environment's only machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerImageParser;

impl RecipeParser for DockerImageParser {
    fn parse(&self, environment: &Environment) -> Result<ContainerEnvironment> {
        let machine = single_machine(environment, DOCKERIMAGE_TYPE)?;
        let image = recipe_content(environment)?.trim();
        Ok(ContainerEnvironment::default().with_container(machine, ContainerConfig::from_image(image)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MachineConfig, Recipe};

    #[test]
    fn test_image_becomes_single_container() -> anyhow::Result<()> {
        let environment = Environment::new(Recipe::new("dockerimage", "eclipse/ubuntu_jdk8\n"))
            .with_machine("dev-machine", MachineConfig::new());

        let parsed = DockerImageParser.parse(&environment)?;

        assert_eq!(
            parsed.containers["dev-machine"].image.as_deref(),
            Some("eclipse/ubuntu_jdk8")
        );
        Ok(())
    }

    #[test]
    fn test_rejects_multiple_machines() {
        let environment = Environment::new(Recipe::new("dockerimage", "busybox"))
            .with_machine("a", MachineConfig::new())
            .with_machine("b", MachineConfig::new());

        let err = DockerImageParser.parse(&environment).unwrap_err();

        assert_eq!(
            err.message(),
            "Environment of type 'dockerimage' doesn't support multiple machines, but contains machines: a, b"
        );
    }
}
