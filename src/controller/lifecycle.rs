//! Lifecycle states of an EnvoyConfigRevision
//!
//! The state is recomputed from the object on every reconciliation. Checks
//! run in a fixed order: initialization, then deletion, then publishing.

use kube::ResourceExt;

use super::conditions::is_condition_true;
use super::finalizers::{add_finalizer, has_finalizer, is_being_deleted};
use crate::crd::{
    EnvoyConfigRevision, ENVOY_API_LABEL, NODE_ID_LABEL, REVISION_PUBLISHED_CONDITION,
    VERSION_LABEL,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevisionState {
    /// Defaults, labels or the finalizer are missing
    Uninitialized,
    /// Deletion was requested; cleanup is still owed when the finalizer is present
    Deleting { has_finalizer: bool },
    Active { published: bool, tainted: bool },
}

pub fn state_of(revision: &EnvoyConfigRevision) -> RevisionState {
    if !is_initialized(revision) {
        return RevisionState::Uninitialized;
    }

    if is_being_deleted(revision) {
        return RevisionState::Deleting {
            has_finalizer: has_finalizer(revision),
        };
    }

    RevisionState::Active {
        published: is_condition_true(revision.conditions(), REVISION_PUBLISHED_CONDITION),
        tainted: revision.status.as_ref().map(|s| s.tainted).unwrap_or(false),
    }
}

/// Whether all defaulted fields, labels and the finalizer are in place
pub fn is_initialized(revision: &EnvoyConfigRevision) -> bool {
    let mut copy = revision.clone();
    !initialize(&mut copy)
}

/// Sets defaulted fields, labels and the finalizer, returning whether anything changed.
///
/// The finalizer is not added to a revision already being deleted, since the
/// API server refuses new finalizers on such objects.
pub fn initialize(revision: &mut EnvoyConfigRevision) -> bool {
    let mut changed = false;

    if revision.spec.envoy_api.is_none() {
        revision.spec.envoy_api = Some(Default::default());
        changed = true;
    }

    if revision.spec.serialization.is_none() {
        revision.spec.serialization = Some(Default::default());
        changed = true;
    }

    let expected = [
        (NODE_ID_LABEL, revision.spec.node_id.clone()),
        (VERSION_LABEL, revision.spec.version.clone()),
        (ENVOY_API_LABEL, revision.envoy_api().to_string()),
    ];
    let labels = revision.labels_mut();
    for (key, value) in expected {
        if labels.get(key) != Some(&value) {
            labels.insert(key.to_string(), value);
            changed = true;
        }
    }

    if !is_being_deleted(revision) && add_finalizer(revision) {
        changed = true;
    }

    changed
}
