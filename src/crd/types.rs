//! Shared types for the EnvoyConfigRevision CRD

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Encoding used for the `value` field of each declared resource
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SerializationFormat {
    /// Plain JSON documents
    #[default]
    Json,
    /// Base64 (standard alphabet) wrapped JSON documents
    B64json,
    /// YAML documents
    Yaml,
}

impl fmt::Display for SerializationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationFormat::Json => write!(f, "json"),
            SerializationFormat::B64json => write!(f, "b64json"),
            SerializationFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Envoy xDS API version a revision targets
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EnvoyApiVersion {
    #[default]
    V2,
    V3,
}

impl EnvoyApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvoyApiVersion::V2 => "v2",
            EnvoyApiVersion::V3 => "v3",
        }
    }
}

impl fmt::Display for EnvoyApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvoyApiVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v2" => Ok(EnvoyApiVersion::V2),
            "v3" => Ok(EnvoyApiVersion::V3),
            other => Err(format!("unsupported envoy API version '{other}'")),
        }
    }
}

/// A single serialized Envoy resource
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct EnvoyResource {
    /// Name of the resource, must match the name inside the serialized value
    pub name: String,
    /// Serialized resource, encoded with the revision's serialization format
    pub value: String,
}

/// Reference to a Kubernetes Secret
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct SecretRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// An Envoy TLS secret loaded from a Kubernetes Secret of type `kubernetes.io/tls`
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct EnvoySecretResource {
    /// Name under which the secret is exposed to Envoy
    pub name: String,
    #[serde(rename = "ref")]
    pub secret_ref: SecretRef,
}

/// The full set of resources declared by a revision
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct EnvoyResources {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<EnvoyResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<EnvoyResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<EnvoyResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub listeners: Vec<EnvoyResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runtimes: Vec<EnvoyResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<EnvoySecretResource>,
}

/// Reports the status of a condition on the EnvoyConfigRevision resource.
/// Follows Kubernetes convention for condition reporting.
///
/// # Examples
///
/// ```rust,no_run
/// use revision_operator::crd::Condition;
///
/// let condition = Condition::new("RevisionPublished", true, "Published", "Revision is live");
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (e.g., "RevisionPublished", "RevisionTainted")
    #[serde(rename = "type")]
    pub type_: String,
    /// Status of the condition: "True", "False", or "Unknown"
    pub status: String,
    /// Last time the condition transitioned
    pub last_transition_time: String,
    /// Machine-readable reason for the condition
    pub reason: String,
    /// Human-readable message
    pub message: String,
}

impl Condition {
    pub fn new(type_: &str, status: bool, reason: &str, message: &str) -> Self {
        Self {
            type_: type_.to_string(),
            status: if status { "True" } else { "False" }.to_string(),
            last_transition_time: chrono::Utc::now().to_rfc3339(),
            reason: reason.to_string(),
            message: message.to_string(),
        }
    }
}
