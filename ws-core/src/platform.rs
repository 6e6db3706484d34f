//! Version of the container orchestration platform.
//!
//! Some mount layouts depend on platform features, most notably per-key
//! sub-path mounts of secret volumes which only work from 1.13 on.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, WorkspaceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformVersion {
    pub major: u32,
    pub minor: u32,
}

impl PlatformVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parses `1.13`, `v1.13`, `1.13.4` or `1.13+` (managed clusters report the latter).
    pub fn parse(version: &str) -> Result<Self> {
        let invalid = || {
            WorkspaceError::Configuration(format!(
                "Invalid platform version '{}'. Expected format is 'major.minor[.patch]'",
                version
            ))
        };

        let trimmed = version.trim().trim_start_matches('v');
        let mut parts = trimmed.split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        let minor_part = parts.next().ok_or_else(invalid)?;
        let minor_digits: String = minor_part
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let minor = minor_digits.parse::<u32>().map_err(|_| invalid())?;

        Ok(Self { major, minor })
    }

    pub fn newer_or_equal_than(&self, major: u32, minor: u32) -> bool {
        *self >= Self::new(major, minor)
    }

    pub fn older_than(&self, major: u32, minor: u32) -> bool {
        !self.newer_or_equal_than(major, minor)
    }
}

impl FromStr for PlatformVersion {
    type Err = WorkspaceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
