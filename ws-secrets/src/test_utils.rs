//! In-memory stand-ins for the platform, for tests of code that provisions secrets.

use std::collections::BTreeMap;

use ws_core::{
    config::DEFAULT_SECRET_LABELS, Container, PodData, PodRole, Result, Secret, WorkloadModel,
};

use crate::provisioner::NamespaceSecrets;
use crate::selector::LabelSelector;

/// A namespace whose secrets live in a vector. Listing honours the selector.
#[derive(Debug, Clone, Default)]
pub struct InMemorySecrets {
    secrets: Vec<Secret>,
}

impl InMemorySecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.secrets.push(secret);
        self
    }
}

impl NamespaceSecrets for InMemorySecrets {
    fn list_by_label_selector(&self, selector: &LabelSelector) -> Result<Vec<Secret>> {
        Ok(self
            .secrets
            .iter()
            .filter(|s| selector.matches(&s.labels))
            .cloned()
            .collect())
    }
}

/// A secret carrying the default workspace secret labels.
pub fn labelled_secret(name: &str) -> Secret {
    let labels: BTreeMap<String, String> = DEFAULT_SECRET_LABELS
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Secret {
        labels,
        ..Secret::new(name)
    }
}

/// A workload with one deployment pod `pod1` holding the named containers.
pub fn deployment_workload(containers: &[&str]) -> WorkloadModel {
    let pod = containers
        .iter()
        .fold(PodData::new(PodRole::Deployment), |pod, name| {
            pod.with_container(Container::new(*name))
        });
    WorkloadModel::new().with_pod("pod1", pod)
}
