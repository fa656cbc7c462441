//! Composable filters for locating revisions
//!
//! Each filter adds one exact-match label requirement. Filters passed together
//! are combined with a logical AND.

use super::store::LabelSelector;
use crate::crd::{EnvoyApiVersion, ENVOY_API_LABEL, NODE_ID_LABEL, VERSION_LABEL};

pub trait RevisionFilter: Send + Sync {
    fn apply_to(&self, selector: &mut LabelSelector);
}

/// Matches revisions targeting a node ID
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ByNodeId(pub String);

impl RevisionFilter for ByNodeId {
    fn apply_to(&self, selector: &mut LabelSelector) {
        selector.insert(NODE_ID_LABEL, self.0.clone());
    }
}

/// Matches revisions with a config version
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ByVersion(pub String);

impl RevisionFilter for ByVersion {
    fn apply_to(&self, selector: &mut LabelSelector) {
        selector.insert(VERSION_LABEL, self.0.clone());
    }
}

/// Matches revisions for an Envoy API version
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ByEnvoyApi(pub EnvoyApiVersion);

impl RevisionFilter for ByEnvoyApi {
    fn apply_to(&self, selector: &mut LabelSelector) {
        selector.insert(ENVOY_API_LABEL, self.0.as_str());
    }
}

pub fn by_node_id(node_id: impl Into<String>) -> ByNodeId {
    ByNodeId(node_id.into())
}

pub fn by_version(version: impl Into<String>) -> ByVersion {
    ByVersion(version.into())
}

pub fn by_envoy_api(api: EnvoyApiVersion) -> ByEnvoyApi {
    ByEnvoyApi(api)
}

/// Combines filters into a single selector
pub fn selector_for(filters: &[&dyn RevisionFilter]) -> LabelSelector {
    let mut selector = LabelSelector::new();
    for filter in filters {
        filter.apply_to(&mut selector);
    }
    selector
}
