//! Main reconciler for EnvoyConfigRevision resources
//!
//! Implements the controller pattern using kube-rs runtime.

use std::sync::Arc;
use std::time::Duration;

use futures::{future, StreamExt, TryStreamExt};
use kube::{
    api::{Api, ListParams},
    client::Client,
    runtime::{
        controller::{Action, Controller},
        reflector, watcher, WatchStreamExt,
    },
    ResourceExt,
};
use tracing::{debug, error, info, instrument, warn};

use super::finalizers::remove_finalizer;
use super::lifecycle::{initialize, state_of, RevisionState};
use super::predicate::ApiVersionFilter;
use super::publish::PublishPipeline;
use super::status::{self, FAILED_LOADING_RESOURCES_REASON};
use super::store::RevisionStore;
use crate::cache::{CleanupError, ServingCache};
use crate::crd::EnvoyConfigRevision;
use crate::error::{Error, Result};

/// Shared state for the controller
pub struct ControllerState {
    pub store: Arc<dyn RevisionStore>,
    pub cache: Arc<dyn ServingCache>,
    pub pipeline: PublishPipeline,
    pub filter: ApiVersionFilter,
}

/// Main entry point to start the controller
///
/// Watches revisions in `namespace`, or in all namespaces when `None`.
pub async fn run_controller(
    client: Client,
    namespace: Option<String>,
    state: Arc<ControllerState>,
) -> Result<()> {
    let revisions: Api<EnvoyConfigRevision> = match &namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    };

    info!(
        "Starting EnvoyConfigRevision controller for envoy API {}",
        state.filter.version()
    );

    // Verify CRD exists
    match revisions.list(&ListParams::default().limit(1)).await {
        Ok(_) => info!("EnvoyConfigRevision CRD is available"),
        Err(e) => {
            error!(
                "EnvoyConfigRevision CRD not found. Please install the CRD first: {:?}",
                e
            );
            return Err(Error::ConfigError(
                "EnvoyConfigRevision CRD not installed".to_string(),
            ));
        }
    }

    let filter = state.filter;
    let (reader, writer) = reflector::store();
    let events = reflector(writer, watcher(revisions, watcher::Config::default()))
        .default_backoff()
        .applied_objects()
        .try_filter(move |revision| future::ready(filter.admits(revision)));

    Controller::for_stream(events, reader)
        .shutdown_on_signal()
        .run(reconcile, error_policy, state)
        .for_each(|res| async move {
            match res {
                Ok(obj) => debug!("Reconciled: {:?}", obj),
                Err(e) => error!("Reconcile error: {:?}", e),
            }
        })
        .await;

    Ok(())
}

/// The main reconciliation function
///
/// This function is called whenever an admitted EnvoyConfigRevision is
/// created, updated or deleted, and when a retry is due.
#[instrument(skip(obj, ctx), fields(name = %obj.name_any(), namespace = obj.namespace()))]
async fn reconcile(obj: Arc<EnvoyConfigRevision>, ctx: Arc<ControllerState>) -> Result<Action> {
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
    ctx.reconcile_revision(&namespace, &obj.name_any()).await
}

impl ControllerState {
    /// Runs one reconciliation pass for the named revision.
    ///
    /// The object is always re-read from the store so that decisions are
    /// based on the latest persisted state.
    pub async fn reconcile_revision(&self, namespace: &str, name: &str) -> Result<Action> {
        let mut revision = match self.store.get(namespace, name).await {
            Ok(revision) => revision,
            Err(e) if e.is_not_found() => {
                debug!("EnvoyConfigRevision {}/{} is gone", namespace, name);
                return Ok(Action::await_change());
            }
            Err(e) => return Err(e),
        };

        if !self.filter.admits(&revision) {
            debug!(
                "Ignoring EnvoyConfigRevision {}/{} for envoy API {}",
                namespace,
                name,
                revision.envoy_api()
            );
            return Ok(Action::await_change());
        }

        match state_of(&revision) {
            RevisionState::Uninitialized => {
                initialize(&mut revision);
                self.store.update(&revision).await?;
                info!("Initialized EnvoyConfigRevision {}/{}", namespace, name);
                return Ok(Action::await_change());
            }
            RevisionState::Deleting {
                has_finalizer: false,
            } => return Ok(Action::await_change()),
            RevisionState::Deleting {
                has_finalizer: true,
            } => return self.cleanup(revision).await,
            RevisionState::Active {
                published: true, ..
            } => {
                revision = self.publish(revision).await?;
            }
            RevisionState::Active { .. } => {}
        }

        status::update_status(self.store.as_ref(), revision).await?;
        Ok(Action::await_change())
    }

    async fn publish(&self, revision: EnvoyConfigRevision) -> Result<EnvoyConfigRevision> {
        match self.pipeline.publish(&revision).await {
            Ok(_) => Ok(revision),
            Err(e) if e.is_permanent() => {
                warn!(
                    "Resources of EnvoyConfigRevision {} cannot be loaded: {}",
                    revision.name_any(),
                    e
                );
                status::taint(
                    self.store.as_ref(),
                    revision,
                    FAILED_LOADING_RESOURCES_REASON,
                    &e.to_string(),
                )
                .await
            }
            Err(e) => {
                warn!(
                    "Transient failure publishing EnvoyConfigRevision {}: {}",
                    revision.name_any(),
                    e
                );
                Err(Error::Publish(e))
            }
        }
    }

    /// Evicts the revision's resources from the serving cache and drops the finalizer.
    ///
    /// The node entry is only evicted while it still holds this revision's
    /// version; otherwise it belongs to another revision and is left alone.
    async fn cleanup(&self, mut revision: EnvoyConfigRevision) -> Result<Action> {
        let node_id = revision.spec.node_id.clone();
        let serving = self
            .cache
            .snapshot(&node_id)
            .await
            .is_some_and(|s| s.version == revision.spec.version);

        let cleared = if serving {
            self.cache.clear_resources(&node_id).await
        } else {
            debug!(
                "Node {} is not serving version {}, nothing to evict",
                node_id, revision.spec.version
            );
            Ok(())
        };

        match cleared {
            Ok(()) if serving => info!("Cleared serving cache for node {}", node_id),
            Ok(()) => {}
            Err(CleanupError::Stale(msg)) => {
                warn!(
                    "Failed to clear serving cache for node {}, continuing with deletion: {}",
                    node_id, msg
                );
            }
            Err(e @ CleanupError::Unavailable(_)) => {
                return Err(Error::CleanupError(e.to_string()));
            }
        }

        remove_finalizer(&mut revision);
        self.store.update(&revision).await?;
        info!(
            "Removed finalizer from EnvoyConfigRevision {}",
            revision.name_any()
        );
        Ok(Action::await_change())
    }
}

/// Error policy determines how to handle reconciliation errors
fn error_policy(
    revision: Arc<EnvoyConfigRevision>,
    error: &Error,
    _ctx: Arc<ControllerState>,
) -> Action {
    error!(
        "Reconciliation error for {}: {:?}",
        revision.name_any(),
        error
    );

    // Use shorter retry for retriable errors
    let retry_duration = if error.is_retriable() {
        Duration::from_secs(5)
    } else {
        Duration::from_secs(60)
    };

    Action::requeue(retry_duration)
}
