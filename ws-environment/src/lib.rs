//! Turns a workspace environment (recipe plus per-machine configuration) into
//! concrete container definitions and checks them before provisioning.
//!
//! ```text
//! Environment --EnvironmentParser--> ContainerEnvironment --EnvironmentValidator--> ok
//!                                          |
//!                                          +--to_workload--> ws_core::WorkloadModel
//! ```

pub mod model;
pub mod parser;
pub mod recipe;
pub mod validator;

pub use model::{
    BuildContext, ContainerConfig, ContainerEnvironment, Environment, MachineConfig, Recipe,
    ServerConfig,
};
pub use parser::{EnvironmentParser, ParserRegistry};
pub use recipe::{ComposeParser, DockerImageParser, DockerfileParser, RecipeParser};
pub use validator::EnvironmentValidator;
pub use ws_core::{Result, WorkspaceError};
