//! Recipe-type specific parsers.

mod compose;
mod dockerfile;
mod dockerimage;

pub use compose::ComposeParser;
pub use dockerfile::DockerfileParser;
pub use dockerimage::DockerImageParser;

use ws_core::{Result, WorkspaceError};

use crate::model::{ContainerEnvironment, Environment};

pub const COMPOSE_TYPE: &str = "compose";
pub const DOCKERIMAGE_TYPE: &str = "dockerimage";
pub const DOCKERFILE_TYPE: &str = "dockerfile";

/// Produces concrete containers from an environment whose recipe has already
/// been checked to carry a type and non-empty content.
pub trait RecipeParser: Send + Sync {
    fn parse(&self, environment: &Environment) -> Result<ContainerEnvironment>;
}

/// Recipe content, or an error if the caller skipped the precondition checks.
pub(crate) fn recipe_content(environment: &Environment) -> Result<&str> {
    environment
        .recipe
        .as_ref()
        .and_then(|r| r.content.as_deref())
        .ok_or_else(|| {
            WorkspaceError::Internal("Environment recipe content is missing".to_string())
        })
}

/// Name of the only machine of a single-container recipe type.
pub(crate) fn single_machine<'a>(environment: &'a Environment, recipe_type: &str) -> Result<&'a str> {
    let mut names = environment.machines.keys();
    match (names.next(), names.next()) {
        (Some(name), None) => Ok(name.as_str()),
        (None, _) => Err(WorkspaceError::Validation(format!(
            "Environment of type '{}' should contain exactly 1 machine, but contains none",
            recipe_type
        ))),
        _ => {
            let names: Vec<&str> = environment.machines.keys().map(String::as_str).collect();
            Err(WorkspaceError::Validation(format!(
                "Environment of type '{}' doesn't support multiple machines, but contains machines: {}",
                recipe_type,
                names.join(", ")
            )))
        }
    }
}
