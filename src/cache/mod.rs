//! xDS serving cache
//!
//! Holds the resources currently served to each Envoy node. The publish
//! pipeline only talks to the [`ServingCache`] trait; [`SnapshotCache`] is the
//! in-process implementation backing the discovery service.

mod snapshot;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::envoy::GeneratedResources;

pub use snapshot::SnapshotCache;

/// Failure to load resources into the cache
///
/// The variant decides how the caller reacts: a validation failure will not
/// go away by retrying, a dependency failure might.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error("resources rejected by the serving cache: {0}")]
    Validation(String),

    #[error("resource dependency unavailable: {0}")]
    Dependency(String),
}

/// Failure to evict a node's resources
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CleanupError {
    /// Eviction failed but the entry may be left behind safely
    #[error("failed to evict resources, entry left stale: {0}")]
    Stale(String),

    /// The cache could not be reached at all
    #[error("serving cache unavailable: {0}")]
    Unavailable(String),
}

/// Result of a successful `set_resources` call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheUpdate {
    /// A new snapshot was stored
    Updated,
    /// The same content was already being served
    Unchanged,
}

/// Resources served to one node
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    /// SHA-256 of the version and resources, used to skip identical pushes
    pub hash: String,
    pub resources: GeneratedResources,
    pub updated_at: String,
}

#[async_trait]
pub trait ServingCache: Send + Sync {
    /// Replaces the resources served to `node_id` with `resources` under `version`
    async fn set_resources(
        &self,
        node_id: &str,
        version: &str,
        resources: GeneratedResources,
    ) -> Result<CacheUpdate, CacheError>;

    /// Removes everything served to `node_id`, succeeding when nothing is present
    async fn clear_resources(&self, node_id: &str) -> Result<(), CleanupError>;

    async fn snapshot(&self, node_id: &str) -> Option<Snapshot>;
}
