//! Access to persisted EnvoyConfigRevision objects
//!
//! The reconciler only needs four operations from the object store. They are
//! behind the [`RevisionStore`] trait so the lifecycle logic can run against
//! the Kubernetes API in production and an in-memory store in tests.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use kube::{
    api::{Api, ListParams, Patch, PatchParams, PostParams},
    Client, ResourceExt,
};
use serde_json::json;

use crate::crd::EnvoyConfigRevision;
use crate::error::{Error, Result};

/// Exact-match label requirements, all of which must hold
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSelector(BTreeMap<String, String>);

impl LabelSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every requirement is present with the exact same value
    pub fn matches(&self, labels: Option<&BTreeMap<String, String>>) -> bool {
        self.0
            .iter()
            .all(|(k, v)| labels.and_then(|l| l.get(k)) == Some(v))
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        f.write_str(&parts.join(","))
    }
}

#[async_trait]
pub trait RevisionStore: Send + Sync {
    /// Fetches a revision by name, failing with `Error::NotFound` when absent
    async fn get(&self, namespace: &str, name: &str) -> Result<EnvoyConfigRevision>;

    /// Lists the revisions of one namespace matching `selector`
    async fn list(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<EnvoyConfigRevision>>;

    /// Persists metadata and spec changes
    async fn update(&self, revision: &EnvoyConfigRevision) -> Result<EnvoyConfigRevision>;

    /// Applies a JSON merge patch to the status subresource.
    ///
    /// The write is rejected with `Error::Conflict` when the stored object
    /// moved past `revision`'s resource version.
    async fn patch_status(
        &self,
        revision: &EnvoyConfigRevision,
        patch: &serde_json::Value,
    ) -> Result<EnvoyConfigRevision>;
}

/// Store backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeRevisionStore {
    client: Client,
}

impl KubeRevisionStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<EnvoyConfigRevision> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn map_kube_error(e: kube::Error, what: String) -> Error {
    match e {
        kube::Error::Api(ref resp) if resp.code == 404 => Error::NotFound(what),
        kube::Error::Api(ref resp) if resp.code == 409 => Error::Conflict(what),
        other => Error::KubeError(other),
    }
}

fn key(revision: &EnvoyConfigRevision) -> String {
    format!(
        "{}/{}",
        revision.namespace().unwrap_or_default(),
        revision.name_any()
    )
}

#[async_trait]
impl RevisionStore for KubeRevisionStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<EnvoyConfigRevision> {
        self.api(namespace)
            .get(name)
            .await
            .map_err(|e| map_kube_error(e, format!("{namespace}/{name}")))
    }

    async fn list(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<EnvoyConfigRevision>> {
        let mut params = ListParams::default();
        if !selector.is_empty() {
            params = params.labels(&selector.to_string());
        }
        let list = self.api(namespace).list(&params).await?;
        Ok(list.items)
    }

    async fn update(&self, revision: &EnvoyConfigRevision) -> Result<EnvoyConfigRevision> {
        let namespace = revision.namespace().unwrap_or_else(|| "default".to_string());
        self.api(&namespace)
            .replace(&revision.name_any(), &PostParams::default(), revision)
            .await
            .map_err(|e| map_kube_error(e, key(revision)))
    }

    async fn patch_status(
        &self,
        revision: &EnvoyConfigRevision,
        patch: &serde_json::Value,
    ) -> Result<EnvoyConfigRevision> {
        let namespace = revision.namespace().unwrap_or_else(|| "default".to_string());

        let mut body = patch.clone();
        body["metadata"] = json!({ "resourceVersion": revision.resource_version() });

        self.api(&namespace)
            .patch_status(
                &revision.name_any(),
                &PatchParams::default(),
                &Patch::Merge(&body),
            )
            .await
            .map_err(|e| map_kube_error(e, key(revision)))
    }
}
