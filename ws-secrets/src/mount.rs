use ws_core::{Result, Secret, WorkspaceError};

use crate::annotations::{self, GIT_CREDENTIAL, MOUNT_AS};

/// How a secret is injected, resolved once from its annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountMode {
    Env,
    File { git_credential: bool },
}

impl MountMode {
    /// Reads `mount-as` (case-insensitive) and, for files, the git-credential flag.
    pub fn resolve(secret: &Secret) -> Result<Self> {
        if secret.annotations.is_none() {
            return Err(WorkspaceError::Configuration(format!(
                "Unable to mount secret '{}': it has missing required annotations. \
                 Please check documentation for secret format guide.",
                secret.name
            )));
        }

        match secret
            .annotation(MOUNT_AS)
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("env") => Ok(MountMode::Env),
            Some("file") => Ok(MountMode::File {
                git_credential: annotations::is_true(secret.annotation(GIT_CREDENTIAL)),
            }),
            _ => Err(WorkspaceError::Configuration(format!(
                "Unable to mount secret '{}': it has missing or unknown type of the mount. \
                 Please make sure that '{}' annotation has value either 'env' or 'file'.",
                secret.name, MOUNT_AS
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ws_core::ErrorKind;

    #[test]
    fn test_resolve_env_case_insensitive() -> anyhow::Result<()> {
        let secret = Secret::new("s").with_annotation(MOUNT_AS, "ENV");
        assert_eq!(MountMode::resolve(&secret)?, MountMode::Env);
        Ok(())
    }

    #[test]
    fn test_resolve_file_with_git_flag() -> anyhow::Result<()> {
        let plain = Secret::new("s").with_annotation(MOUNT_AS, "file");
        let git = plain.clone().with_annotation(GIT_CREDENTIAL, "True");
        assert_eq!(
            MountMode::resolve(&plain)?,
            MountMode::File {
                git_credential: false
            }
        );
        assert_eq!(
            MountMode::resolve(&git)?,
            MountMode::File {
                git_credential: true
            }
        );
        Ok(())
    }

    #[test]
    fn test_resolve_unknown_or_absent_mode() {
        let unknown = Secret::new("s").with_annotation(MOUNT_AS, "volume");
        let absent = Secret::new("s").with_annotation("other", "x");

        for secret in [unknown, absent] {
            let err = MountMode::resolve(&secret).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration);
            assert!(err.to_string().contains("either 'env' or 'file'"));
        }
    }

    #[test]
    fn test_resolve_without_annotations() {
        let err = MountMode::resolve(&Secret::new("bare")).unwrap_err();
        assert!(err
            .to_string()
            .contains("Unable to mount secret 'bare': it has missing required annotations"));
    }
}
