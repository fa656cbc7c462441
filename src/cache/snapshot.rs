use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

use super::{CacheError, CacheUpdate, CleanupError, ServingCache, Snapshot};
use crate::envoy::GeneratedResources;

/// In-memory snapshot cache keyed by node ID
#[derive(Clone, Debug, Default)]
pub struct SnapshotCache {
    snapshots: Arc<RwLock<HashMap<String, Snapshot>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn node_ids(&self) -> Vec<String> {
        let snapshots = self.snapshots.read().await;
        let mut ids: Vec<String> = snapshots.keys().cloned().collect();
        ids.sort();
        ids
    }
}

fn validate(resources: &GeneratedResources) -> Result<(), CacheError> {
    for (kind, list) in &resources.resources {
        let mut seen = HashSet::new();
        for resource in list {
            if resource.type_url.is_empty() {
                return Err(CacheError::Validation(format!(
                    "{kind} '{}' has no type URL",
                    resource.name
                )));
            }
            if !seen.insert(resource.name.as_str()) {
                return Err(CacheError::Validation(format!(
                    "duplicate {kind} name '{}'",
                    resource.name
                )));
            }
        }
    }
    Ok(())
}

fn content_hash(version: &str, resources: &GeneratedResources) -> Result<String, CacheError> {
    let encoded = serde_json::to_vec(&(version, resources))
        .map_err(|e| CacheError::Validation(format!("resources are not serializable: {e}")))?;
    Ok(hex::encode(Sha256::digest(&encoded)))
}

#[async_trait]
impl ServingCache for SnapshotCache {
    async fn set_resources(
        &self,
        node_id: &str,
        version: &str,
        resources: GeneratedResources,
    ) -> Result<CacheUpdate, CacheError> {
        validate(&resources)?;
        let hash = content_hash(version, &resources)?;

        let mut snapshots = self.snapshots.write().await;
        if snapshots.get(node_id).is_some_and(|s| s.hash == hash) {
            debug!("Snapshot for node {} version {} unchanged", node_id, version);
            return Ok(CacheUpdate::Unchanged);
        }

        snapshots.insert(
            node_id.to_string(),
            Snapshot {
                version: version.to_string(),
                hash,
                resources,
                updated_at: chrono::Utc::now().to_rfc3339(),
            },
        );
        debug!("Stored snapshot for node {} version {}", node_id, version);
        Ok(CacheUpdate::Updated)
    }

    async fn clear_resources(&self, node_id: &str) -> Result<(), CleanupError> {
        self.snapshots.write().await.remove(node_id);
        Ok(())
    }

    async fn snapshot(&self, node_id: &str) -> Option<Snapshot> {
        self.snapshots.read().await.get(node_id).cloned()
    }
}
