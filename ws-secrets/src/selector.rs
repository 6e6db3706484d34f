use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ws_core::{Result, WorkspaceError};

/// Label selector built from a comma separated list of `key=value` (equality)
/// and bare `key` (presence) expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    match_labels: BTreeMap<String, String>,
    exists: BTreeSet<String>,
}

impl LabelSelector {
    pub fn parse(expression: &str) -> Result<Self> {
        let mut selector = Self::default();

        for entry in expression.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.split_once('=') {
                Some((key, value)) => {
                    let key = key.trim();
                    if key.is_empty() {
                        return Err(empty_key(expression));
                    }
                    selector
                        .match_labels
                        .insert(key.to_string(), value.trim().to_string());
                }
                None => {
                    selector.exists.insert(entry.to_string());
                }
            }
        }

        if selector.is_empty() {
            return Err(WorkspaceError::Configuration(format!(
                "Label selector '{}' does not contain any label expression",
                expression
            )));
        }
        Ok(selector)
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.match_labels
            .iter()
            .all(|(k, v)| labels.get(k) == Some(v))
            && self.exists.iter().all(|k| labels.contains_key(k))
    }

    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty() && self.exists.is_empty()
    }

    pub fn match_labels(&self) -> &BTreeMap<String, String> {
        &self.match_labels
    }

    pub fn exists(&self) -> &BTreeSet<String> {
        &self.exists
    }
}

fn empty_key(expression: &str) -> WorkspaceError {
    WorkspaceError::Configuration(format!(
        "Label selector '{}' contains an expression without a label key",
        expression
    ))
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self
            .match_labels
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .chain(self.exists.iter().cloned())
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_equality_and_presence() -> anyhow::Result<()> {
        let selector = LabelSelector::parse(" app=che , workspace-secret ,, tier = dev")?;
        assert_eq!(selector.match_labels().get("app").map(String::as_str), Some("che"));
        assert_eq!(selector.match_labels().get("tier").map(String::as_str), Some("dev"));
        assert!(selector.exists().contains("workspace-secret"));
        Ok(())
    }

    #[test]
    fn test_matches() -> anyhow::Result<()> {
        let selector = LabelSelector::parse("app=che,workspace-secret")?;
        assert!(selector.matches(&labels(&[("app", "che"), ("workspace-secret", "")])));
        assert!(selector.matches(&labels(&[
            ("app", "che"),
            ("workspace-secret", "yes"),
            ("extra", "x")
        ])));
        assert!(!selector.matches(&labels(&[("app", "che")])));
        assert!(!selector.matches(&labels(&[("app", "other"), ("workspace-secret", "")])));
        Ok(())
    }

    #[test]
    fn test_parse_rejects_empty_key_and_empty_selector() {
        assert!(LabelSelector::parse("=value").is_err());
        assert!(LabelSelector::parse(" , ").is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() -> anyhow::Result<()> {
        let selector = LabelSelector::parse("b=2,a=1,present")?;
        assert_eq!(selector.to_string(), "a=1,b=2,present");
        assert_eq!(LabelSelector::parse(&selector.to_string())?, selector);
        Ok(())
    }
}
