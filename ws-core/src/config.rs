// Standard library imports
use std::fs;
use std::path::Path;

// External crate imports
use serde::{Deserialize, Serialize};
use serde_yaml_ng as serde_yaml;

// Internal imports
use crate::error::{Result, WorkspaceError};
use crate::platform::PlatformVersion;

pub const DEFAULT_SECRET_LABELS: &str =
    "app.kubernetes.io/part-of=che.eclipse.org,app.kubernetes.io/component=workspace-secret";
pub const DEFAULT_PLATFORM_VERSION: &str = "1.13";
pub const DEFAULT_GIT_CONFIG_MAP: &str = "gitconfig";

/// Infrastructure settings handed explicitly to the provisioning components.
///
/// Every field has a default so a partial YAML document is enough:
///
/// ```yaml
/// secret_labels: "app.kubernetes.io/part-of=che.eclipse.org"
/// platform_version: "1.21"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfrastructureConfig {
    /// Comma separated `key` or `key=value` expressions selecting workspace secrets.
    pub secret_labels: String,
    pub platform_version: String,
    /// Name of the config map holding the workspace git configuration.
    pub git_config_map: String,
    /// Length of the random suffix appended to colliding volume names.
    pub volume_suffix_length: usize,
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            secret_labels: DEFAULT_SECRET_LABELS.to_string(),
            platform_version: DEFAULT_PLATFORM_VERSION.to_string(),
            git_config_map: DEFAULT_GIT_CONFIG_MAP.to_string(),
            volume_suffix_length: 6,
        }
    }
}

impl InfrastructureConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        tracing::debug!("Loaded infrastructure config from {}", path.display());
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.secret_labels.trim().is_empty() {
            return Err(WorkspaceError::Configuration(
                "'secret_labels' must name at least one label".to_string(),
            ));
        }
        if self.git_config_map.trim().is_empty() {
            return Err(WorkspaceError::Configuration(
                "'git_config_map' must not be empty".to_string(),
            ));
        }
        if self.volume_suffix_length == 0 {
            return Err(WorkspaceError::Configuration(
                "'volume_suffix_length' must be greater than zero".to_string(),
            ));
        }
        self.platform_version()?;
        Ok(())
    }

    pub fn platform_version(&self) -> Result<PlatformVersion> {
        PlatformVersion::parse(&self.platform_version)
    }
}
