//! Publish pipeline: decode, generate and load a revision into the serving cache
//!
//! Failures are split in two classes. Permanent failures come from the
//! revision's own content and will not heal by retrying, so the caller taints
//! the revision. Transient failures come from dependencies (currently only
//! Kubernetes Secrets) and are returned for a retry with backoff.

use std::sync::Arc;

use kube::ResourceExt;
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::secrets::SecretSource;
use crate::cache::{CacheError, CacheUpdate, ServingCache};
use crate::crd::EnvoyConfigRevision;
use crate::envoy::{
    DecodeError, GenerationError, ResourceDecoder, ResourceGenerator, ResourceKind,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PublishError {
    #[error("failed to decode resources: {0}")]
    Decode(#[from] DecodeError),

    #[error("failed to generate resources: {0}")]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl PublishError {
    /// Whether the failure is caused by the revision's own content
    pub fn is_permanent(&self) -> bool {
        !matches!(self, PublishError::Cache(CacheError::Dependency(_)))
    }
}

pub struct PublishPipeline {
    decoder: Arc<dyn ResourceDecoder>,
    generator: Arc<dyn ResourceGenerator>,
    secrets: Arc<dyn SecretSource>,
    cache: Arc<dyn ServingCache>,
}

impl PublishPipeline {
    pub fn new(
        decoder: Arc<dyn ResourceDecoder>,
        generator: Arc<dyn ResourceGenerator>,
        secrets: Arc<dyn SecretSource>,
        cache: Arc<dyn ServingCache>,
    ) -> Self {
        Self {
            decoder,
            generator,
            secrets,
            cache,
        }
    }

    /// Makes the revision's resources the ones served to its node ID
    #[instrument(skip(self, revision), fields(name = %revision.name_any(), node_id = %revision.spec.node_id, version = %revision.spec.version))]
    pub async fn publish(
        &self,
        revision: &EnvoyConfigRevision,
    ) -> Result<CacheUpdate, PublishError> {
        let namespace = revision.namespace().unwrap_or_else(|| "default".to_string());

        let set = self
            .decoder
            .decode(&revision.spec.envoy_resources, revision.serialization())?;
        let mut generated = self.generator.generate(set)?;

        for secret in std::mem::take(&mut generated.secret_refs) {
            let secret_ns = secret
                .secret_ref
                .namespace
                .as_deref()
                .unwrap_or(&namespace);
            let material = self
                .secrets
                .tls_material(secret_ns, &secret.secret_ref.name)
                .await?;
            generated.push(
                ResourceKind::Secret,
                self.generator
                    .secret_resource(&secret.name, &material.cert_pem, &material.key_pem),
            );
        }

        let update = self
            .cache
            .set_resources(&revision.spec.node_id, &revision.spec.version, generated)
            .await?;

        match update {
            CacheUpdate::Updated => info!(
                "Published version {} for node {}",
                revision.spec.version, revision.spec.node_id
            ),
            CacheUpdate::Unchanged => debug!(
                "Version {} for node {} already published",
                revision.spec.version, revision.spec.node_id
            ),
        }
        Ok(update)
    }
}
