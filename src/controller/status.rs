//! Status reconciliation for EnvoyConfigRevisions
//!
//! `status.published` and `status.tainted` are a cached summary of the
//! condition list. The summary is recomputed as a pure projection and only
//! the fields that differ are written back, so an up-to-date revision causes
//! no write and therefore no new watch event.

use chrono::{DateTime, Utc};
use kube::ResourceExt;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::conditions::{
    is_condition_true, set_condition_at, CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE,
};
use super::store::RevisionStore;
use crate::crd::{
    EnvoyConfigRevision, EnvoyConfigRevisionStatus, RESOURCES_OUT_OF_SYNC_CONDITION,
    REVISION_PUBLISHED_CONDITION, REVISION_TAINTED_CONDITION,
};
use crate::error::Result;

/// Reason recorded when the revision's resources could not be loaded
pub const FAILED_LOADING_RESOURCES_REASON: &str = "FailedLoadingResources";
const SYNCED_REASON: &str = "RevisionSynced";
const SYNCED_MESSAGE: &str = "EnvoyConfigRevision successfully synced";

/// Projects the condition list onto the status summary fields
pub fn project_status(
    current: &EnvoyConfigRevisionStatus,
    now: DateTime<Utc>,
) -> EnvoyConfigRevisionStatus {
    let mut next = current.clone();
    let published = is_condition_true(&current.conditions, REVISION_PUBLISHED_CONDITION);
    let tainted = is_condition_true(&current.conditions, REVISION_TAINTED_CONDITION);

    if is_condition_true(&current.conditions, RESOURCES_OUT_OF_SYNC_CONDITION) {
        set_condition_at(
            &mut next.conditions,
            RESOURCES_OUT_OF_SYNC_CONDITION,
            CONDITION_STATUS_FALSE,
            SYNCED_REASON,
            SYNCED_MESSAGE,
            now,
        );
    }

    if published && !next.published {
        next.published = true;
        next.last_published_at = Some(now.to_rfc3339());
        // A fresh publish starts with clean taint bookkeeping
        next.tainted = false;
    } else if !published && next.published {
        next.published = false;
    }

    if tainted != next.tainted {
        next.tainted = tainted;
    }

    next
}

/// Merge patch holding only the status fields that differ, `None` when equal
pub fn status_patch(
    current: &EnvoyConfigRevisionStatus,
    desired: &EnvoyConfigRevisionStatus,
) -> Option<Value> {
    let mut changed = Map::new();

    if current.published != desired.published {
        changed.insert("published".to_string(), json!(desired.published));
    }
    if current.tainted != desired.tainted {
        changed.insert("tainted".to_string(), json!(desired.tainted));
    }
    if current.last_published_at != desired.last_published_at {
        changed.insert(
            "lastPublishedAt".to_string(),
            json!(desired.last_published_at),
        );
    }
    if current.conditions != desired.conditions {
        changed.insert("conditions".to_string(), json!(desired.conditions));
    }

    if changed.is_empty() {
        None
    } else {
        Some(json!({ "status": changed }))
    }
}

/// Brings the status summary in line with the conditions, writing only on change
pub async fn update_status(
    store: &dyn RevisionStore,
    revision: EnvoyConfigRevision,
) -> Result<EnvoyConfigRevision> {
    let current = revision.status.clone().unwrap_or_default();
    let desired = project_status(&current, Utc::now());

    match status_patch(&current, &desired) {
        Some(patch) => {
            debug!("Patching status of EnvoyConfigRevision {}", revision.name_any());
            store.patch_status(&revision, &patch).await
        }
        None => Ok(revision),
    }
}

/// Marks the revision as tainted, unless it already is
pub async fn taint(
    store: &dyn RevisionStore,
    revision: EnvoyConfigRevision,
    reason: &str,
    message: &str,
) -> Result<EnvoyConfigRevision> {
    let current = revision.status.clone().unwrap_or_default();
    if is_condition_true(&current.conditions, REVISION_TAINTED_CONDITION) {
        debug!(
            "EnvoyConfigRevision {} already tainted, skipping",
            revision.name_any()
        );
        return Ok(revision);
    }

    let mut conditions = current.conditions;
    set_condition_at(
        &mut conditions,
        REVISION_TAINTED_CONDITION,
        CONDITION_STATUS_TRUE,
        reason,
        message,
        Utc::now(),
    );

    info!(
        "Tainting EnvoyConfigRevision {}: {}",
        revision.name_any(),
        message
    );
    let patch = json!({
        "status": {
            "conditions": conditions,
            "tainted": true,
        }
    });
    store.patch_status(&revision, &patch).await
}
