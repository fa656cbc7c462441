//! Finalizer handling for EnvoyConfigRevision cleanup
//!
//! The finalizer keeps a deleted revision around until its resources have
//! been evicted from the serving cache. Helpers here only touch the in-memory
//! object; the reconciler persists the change through the revision store.

use kube::ResourceExt;

use crate::crd::EnvoyConfigRevision;

/// Finalizer name used to protect EnvoyConfigRevision resources
pub const REVISION_FINALIZER: &str = "finalizer.marin3r.3scale.net";

/// Check if the revision is being deleted
///
/// A deletion timestamp indicates the user has requested deletion,
/// but finalizers are preventing the actual removal.
pub fn is_being_deleted(revision: &EnvoyConfigRevision) -> bool {
    revision.metadata.deletion_timestamp.is_some()
}

/// Check if the revision has our finalizer
pub fn has_finalizer(revision: &EnvoyConfigRevision) -> bool {
    revision
        .finalizers()
        .iter()
        .any(|f| f == REVISION_FINALIZER)
}

/// Add our finalizer if not present, returning whether it was added
pub fn add_finalizer(revision: &mut EnvoyConfigRevision) -> bool {
    if has_finalizer(revision) {
        return false;
    }
    revision
        .finalizers_mut()
        .push(REVISION_FINALIZER.to_string());
    true
}

/// Remove our finalizer, leaving any other finalizers in place
pub fn remove_finalizer(revision: &mut EnvoyConfigRevision) {
    revision
        .finalizers_mut()
        .retain(|f| f.as_str() != REVISION_FINALIZER);
}
