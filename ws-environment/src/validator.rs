//! Structural checks on a parsed environment.
//!
//! Every violation is a [`WorkspaceError::Validation`] naming the environment
//! and the offending machine or field.

// External crate imports
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::instrument;

// Internal imports
use ws_core::{Result, WorkspaceError};

use crate::model::{ContainerConfig, ContainerEnvironment, Environment, MachineConfig};

const MAX_PORT: u32 = 65535;

struct Patterns {
    machine_name: Regex,
    port: Regex,
    server_protocol: Regex,
    link: Regex,
    dependency: Regex,
    volumes_from: Regex,
}

impl Patterns {
    fn compile() -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            machine_name: Regex::new(r"^[a-zA-Z0-9_.-]+$")?,
            port: Regex::new(r"^(?P<number>[1-9][0-9]*)(/(tcp|udp))?$")?,
            server_protocol: Regex::new(r"^[a-z][a-z0-9+.-]*$")?,
            link: Regex::new(r"^(?P<target>[a-zA-Z0-9_.-]+)(:[a-zA-Z0-9_.-]+)?$")?,
            dependency: Regex::new(r"^(?P<target>[a-zA-Z0-9_.-]+)$")?,
            volumes_from: Regex::new(r"^(?P<target>[a-zA-Z0-9_.-]+)(:(ro|rw))?$")?,
        })
    }
}

static PATTERNS: Lazy<std::result::Result<Patterns, regex::Error>> = Lazy::new(Patterns::compile);

fn patterns() -> Result<&'static Patterns> {
    PATTERNS
        .as_ref()
        .map_err(|e| WorkspaceError::Internal(format!("Invalid validation pattern: {}", e)))
}

fn invalid(message: String) -> WorkspaceError {
    WorkspaceError::Validation(message)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentValidator;

impl EnvironmentValidator {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(self, environment, containers))]
    pub fn validate(
        &self,
        env_name: &str,
        environment: &Environment,
        containers: &ContainerEnvironment,
    ) -> Result<()> {
        let patterns = patterns()?;

        if env_name.trim().is_empty() {
            return Err(invalid("Environment name should not be empty".to_string()));
        }
        if environment.machines.is_empty() {
            return Err(invalid(format!(
                "Environment '{}' should contain at least 1 machine",
                env_name
            )));
        }
        if containers.containers.is_empty() {
            return Err(invalid(format!(
                "Environment '{}' should contain at least 1 container",
                env_name
            )));
        }

        // Containers without machine config are fine, the reverse is not.
        let missing: Vec<&str> = environment
            .machines
            .keys()
            .filter(|name| !containers.containers.contains_key(*name))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(invalid(format!(
                "Environment '{}' contains machines that are missing in recipe: {}",
                env_name,
                missing.join(", ")
            )));
        }

        let agents: Vec<&str> = environment
            .machines
            .iter()
            .filter(|(_, machine)| machine.is_ws_agent())
            .map(|(name, _)| name.as_str())
            .collect();
        if agents.len() != 1 {
            return Err(invalid(format!(
                "Environment '{}' should contain exactly 1 machine with ws-agent, but contains '{}'. All machines with ws-agent: [{}]",
                env_name,
                agents.len(),
                agents.join(", ")
            )));
        }

        for (name, machine) in &environment.machines {
            validate_machine(patterns, env_name, name, machine)?;
        }
        for (name, container) in &containers.containers {
            validate_container(patterns, env_name, name, container, containers)?;
        }
        Ok(())
    }
}

fn validate_name(patterns: &Patterns, env_name: &str, machine_name: &str) -> Result<()> {
    if patterns.machine_name.is_match(machine_name) {
        Ok(())
    } else {
        Err(invalid(format!(
            "Name of machine '{}' in environment '{}' is invalid",
            machine_name, env_name
        )))
    }
}

fn is_valid_port(patterns: &Patterns, port: &str) -> bool {
    patterns
        .port
        .captures(port)
        .and_then(|c| c.name("number"))
        .and_then(|n| n.as_str().parse::<u32>().ok())
        .is_some_and(|n| (1..=MAX_PORT).contains(&n))
}

fn validate_machine(
    patterns: &Patterns,
    env_name: &str,
    machine_name: &str,
    machine: &MachineConfig,
) -> Result<()> {
    validate_name(patterns, env_name, machine_name)?;

    for (reference, server) in &machine.servers {
        if !is_valid_port(patterns, &server.port) {
            return Err(invalid(format!(
                "Machine '{}' in environment '{}' contains server conf '{}' with invalid port '{}'",
                machine_name, env_name, reference, server.port
            )));
        }
        if let Some(protocol) = &server.protocol {
            if !patterns.server_protocol.is_match(protocol) {
                return Err(invalid(format!(
                    "Machine '{}' in environment '{}' contains server conf '{}' with invalid protocol '{}'",
                    machine_name, env_name, reference, protocol
                )));
            }
        }
    }
    Ok(())
}

/// Checks a `target[:suffix]` reference to another container.
fn validate_reference(
    pattern: &Regex,
    field: &str,
    value: &str,
    env_name: &str,
    machine_name: &str,
    containers: &ContainerEnvironment,
) -> Result<()> {
    let target = pattern
        .captures(value)
        .and_then(|c| c.name("target"))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            invalid(format!(
                "Value '{}' of field '{}' of machine '{}' in environment '{}' is invalid",
                value, field, machine_name, env_name
            ))
        })?;
    if target == machine_name {
        return Err(invalid(format!(
            "Machine '{}' in environment '{}' can not reference itself in field '{}'",
            machine_name, env_name, field
        )));
    }
    if !containers.containers.contains_key(target) {
        return Err(invalid(format!(
            "Machine '{}' in environment '{}' contains reference to non existing machine '{}' in field '{}'",
            machine_name, env_name, target, field
        )));
    }
    Ok(())
}

fn validate_container(
    patterns: &Patterns,
    env_name: &str,
    machine_name: &str,
    container: &ContainerConfig,
    containers: &ContainerEnvironment,
) -> Result<()> {
    validate_name(patterns, env_name, machine_name)?;

    let has_image = container.image.as_deref().is_some_and(|i| !i.trim().is_empty());
    let has_build = container
        .build
        .as_ref()
        .is_some_and(|b| b.context.is_some() || b.dockerfile_content.is_some());
    match (has_image, has_build) {
        (true, true) => {
            return Err(invalid(format!(
                "Machine '{}' in environment '{}' contains both 'image' and 'build', only one of them is allowed",
                machine_name, env_name
            )))
        }
        (false, false) => {
            return Err(invalid(format!(
                "Field 'image' or 'build' is required in machine '{}' in environment '{}'",
                machine_name, env_name
            )))
        }
        _ => {}
    }

    for port in &container.expose {
        if !is_valid_port(patterns, port) {
            return Err(invalid(format!(
                "Exposed port '{}' in machine '{}' in environment '{}' is invalid",
                port, machine_name, env_name
            )));
        }
    }

    for link in &container.links {
        validate_reference(&patterns.link, "links", link, env_name, machine_name, containers)?;
    }
    for dependency in &container.depends_on {
        validate_reference(
            &patterns.dependency,
            "depends_on",
            dependency,
            env_name,
            machine_name,
            containers,
        )?;
    }
    for source in &container.volumes_from {
        validate_reference(
            &patterns.volumes_from,
            "volumes_from",
            source,
            env_name,
            machine_name,
            containers,
        )?;
    }

    if !container.ports.is_empty() {
        return Err(invalid(format!(
            "Ports binding is forbidden but found in machine '{}' of environment '{}'",
            machine_name, env_name
        )));
    }
    if !container.volumes.is_empty() {
        return Err(invalid(format!(
            "Volumes binding is forbidden but found in machine '{}' of environment '{}'",
            machine_name, env_name
        )));
    }
    if !container.networks.is_empty() {
        return Err(invalid(format!(
            "Networks configuration is forbidden but found in machine '{}' of environment '{}'",
            machine_name, env_name
        )));
    }
    Ok(())
}
