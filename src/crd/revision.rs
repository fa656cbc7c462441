//! EnvoyConfigRevision Custom Resource Definition
//!
//! An EnvoyConfigRevision is one immutable, versioned set of Envoy resources
//! targeted at a single node ID. The operator decides whether its resources
//! are live in the xDS serving cache and records the outcome in its status.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{Condition, EnvoyApiVersion, EnvoyResources, SerializationFormat};

/// Label carrying the target node ID
pub const NODE_ID_LABEL: &str = "marin3r.3scale.net/node-id";
/// Label carrying the config version
pub const VERSION_LABEL: &str = "marin3r.3scale.net/config-version";
/// Label carrying the envoy API version
pub const ENVOY_API_LABEL: &str = "marin3r.3scale.net/envoy-api";

/// Condition set by the publishing side when this revision should be live
pub const REVISION_PUBLISHED_CONDITION: &str = "RevisionPublished";
/// Condition set when the revision's resources cannot be loaded
pub const REVISION_TAINTED_CONDITION: &str = "RevisionTainted";
/// Condition set when the status no longer reflects what is in the cache
pub const RESOURCES_OUT_OF_SYNC_CONDITION: &str = "ResourcesOutOfSync";

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "marin3r.3scale.net",
    version = "v1alpha1",
    kind = "EnvoyConfigRevision",
    namespaced,
    status = "EnvoyConfigRevisionStatus",
    shortname = "ecr",
    printcolumn = r#"{"name":"Node ID","type":"string","jsonPath":".spec.nodeID"}"#,
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#,
    printcolumn = r#"{"name":"Published","type":"boolean","jsonPath":".status.published"}"#,
    printcolumn = r#"{"name":"Tainted","type":"boolean","jsonPath":".status.tainted"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct EnvoyConfigRevisionSpec {
    /// Envoy node ID the resources are served to
    #[serde(rename = "nodeID")]
    pub node_id: String,

    /// Opaque version tag, unique together with the node ID
    pub version: String,

    #[serde(rename = "envoyAPI", default, skip_serializing_if = "Option::is_none")]
    pub envoy_api: Option<EnvoyApiVersion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialization: Option<SerializationFormat>,

    #[serde(default)]
    pub envoy_resources: EnvoyResources,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvoyConfigRevisionStatus {
    #[serde(default)]
    pub published: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_published_at: Option<String>,

    #[serde(default)]
    pub tainted: bool,

    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl EnvoyConfigRevision {
    /// Envoy API version, `v2` when not declared
    pub fn envoy_api(&self) -> EnvoyApiVersion {
        self.spec.envoy_api.unwrap_or_default()
    }

    /// Serialization format, `json` when not declared
    pub fn serialization(&self) -> SerializationFormat {
        self.spec.serialization.unwrap_or_default()
    }

    pub fn conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or(&[])
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(key))
            .map(String::as_str)
    }
}
