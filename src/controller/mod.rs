//! Controller module for EnvoyConfigRevision reconciliation
//! This module contains the main controller loop, the revision lifecycle,
//! the publish pipeline and the status reconciler.

pub mod conditions;
pub mod filters;
pub mod finalizers;
pub mod lifecycle;
pub mod predicate;
pub mod publish;
mod reconciler;
pub mod revisions;
pub mod secrets;
pub mod status;
pub mod store;
#[cfg(test)]
pub(crate) mod testing;

pub use filters::{by_envoy_api, by_node_id, by_version, RevisionFilter};
pub use finalizers::REVISION_FINALIZER;
pub use predicate::ApiVersionFilter;
pub use publish::{PublishError, PublishPipeline};
pub use reconciler::{run_controller, ControllerState};
pub use secrets::{KubeSecretSource, SecretSource, TlsMaterial};
pub use store::{KubeRevisionStore, LabelSelector, RevisionStore};
