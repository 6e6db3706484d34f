//! Loading infrastructure configuration from disk.

use std::fs;
use tempfile::TempDir;
use ws_core::{ErrorKind, InfrastructureConfig, PlatformVersion};

#[test]
fn test_load_config_from_file() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("infrastructure.yaml");
    fs::write(
        &path,
        "secret_labels: \"app=che,component\"\nplatform_version: \"1.21\"\ngit_config_map: workspace-gitconfig\n",
    )?;

    let config = InfrastructureConfig::load(&path)?;

    assert_eq!(config.secret_labels, "app=che,component");
    assert_eq!(config.platform_version()?, PlatformVersion::new(1, 21));
    assert_eq!(config.git_config_map, "workspace-gitconfig");
    assert_eq!(config.volume_suffix_length, 6);
    Ok(())
}

#[test]
fn test_load_missing_file_is_io_error() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let err = InfrastructureConfig::load(&temp_dir.path().join("missing.yaml")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    Ok(())
}

#[test]
fn test_load_malformed_yaml_is_serialization_error() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("broken.yaml");
    fs::write(&path, "secret_labels: [unterminated\n")?;

    let err = InfrastructureConfig::load(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Serialization);
    Ok(())
}
