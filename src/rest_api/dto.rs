//! Response types for the REST API

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::Snapshot;
use crate::envoy::ResourceKind;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

/// Summary of what the serving cache holds for one node
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshotResponse {
    pub node_id: String,
    pub version: String,
    pub hash: String,
    pub updated_at: String,
    pub resources: BTreeMap<ResourceKind, usize>,
}

impl CacheSnapshotResponse {
    pub fn from_snapshot(node_id: &str, snapshot: &Snapshot) -> Self {
        Self {
            node_id: node_id.to_string(),
            version: snapshot.version.clone(),
            hash: snapshot.hash.clone(),
            updated_at: snapshot.updated_at.clone(),
            resources: ResourceKind::ALL
                .iter()
                .map(|kind| (*kind, snapshot.resources.count(*kind)))
                .collect(),
        }
    }
}
