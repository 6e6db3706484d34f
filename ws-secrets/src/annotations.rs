//! Metadata keys recognised on workspace secrets.
//!
//! | key                                      | meaning                                        |
//! |------------------------------------------|------------------------------------------------|
//! | `che.eclipse.org/mount-as`               | `env` or `file`                                |
//! | `che.eclipse.org/mount-path`             | base directory for `file` secrets              |
//! | `che.eclipse.org/env-name`               | variable name of a single-entry `env` secret   |
//! | `che.eclipse.org/{key}_env-name`         | variable name of data entry `key`              |
//! | `che.eclipse.org/automount-workspace-secret` | mount into every container by default      |
//! | `che.eclipse.org/git-credential`         | register the file as a git credential store    |

pub const ANNOTATION_PREFIX: &str = "che.eclipse.org";

pub const MOUNT_AS: &str = "che.eclipse.org/mount-as";
pub const MOUNT_PATH: &str = "che.eclipse.org/mount-path";
pub const ENV_NAME: &str = "che.eclipse.org/env-name";
pub const AUTOMOUNT: &str = "che.eclipse.org/automount-workspace-secret";
pub const GIT_CREDENTIAL: &str = "che.eclipse.org/git-credential";

const ENV_NAME_TEMPLATE_SUFFIX: &str = "_env-name";

/// Per-key variable name annotation, e.g. `che.eclipse.org/token_env-name`.
pub fn env_name_annotation(key: &str) -> String {
    format!("{}/{}{}", ANNOTATION_PREFIX, key, ENV_NAME_TEMPLATE_SUFFIX)
}

/// Boolean annotation values are true only when spelled `true`, in any case.
pub fn is_true(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}
