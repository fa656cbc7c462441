//! Envoy resource model
//!
//! Turns the serialized resources declared in a revision into typed documents
//! ready to be loaded into the xDS serving cache:
//!
//! 1. [`serializer`] decodes each declared value according to the revision's
//!    serialization format
//! 2. [`generator`] checks the decoded documents and stamps their type URLs

pub mod generator;
pub mod serializer;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::crd::{EnvoyApiVersion, EnvoySecretResource};

pub use generator::{EnvoyGenerator, GenerationError, ResourceGenerator};
pub use serializer::{DecodeError, ResourceDecoder, SerdeDecoder};

/// Kinds of resources served over xDS
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Endpoint,
    Cluster,
    Route,
    Listener,
    Runtime,
    Secret,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Endpoint,
        ResourceKind::Cluster,
        ResourceKind::Route,
        ResourceKind::Listener,
        ResourceKind::Runtime,
        ResourceKind::Secret,
    ];

    /// Protobuf type URL for this kind under the given API version
    pub fn type_url(&self, api: EnvoyApiVersion) -> &'static str {
        match (api, self) {
            (EnvoyApiVersion::V2, ResourceKind::Endpoint) => {
                "type.googleapis.com/envoy.api.v2.ClusterLoadAssignment"
            }
            (EnvoyApiVersion::V2, ResourceKind::Cluster) => "type.googleapis.com/envoy.api.v2.Cluster",
            (EnvoyApiVersion::V2, ResourceKind::Route) => {
                "type.googleapis.com/envoy.api.v2.RouteConfiguration"
            }
            (EnvoyApiVersion::V2, ResourceKind::Listener) => {
                "type.googleapis.com/envoy.api.v2.Listener"
            }
            (EnvoyApiVersion::V2, ResourceKind::Runtime) => {
                "type.googleapis.com/envoy.service.discovery.v2.Runtime"
            }
            (EnvoyApiVersion::V2, ResourceKind::Secret) => {
                "type.googleapis.com/envoy.api.v2.auth.Secret"
            }
            (EnvoyApiVersion::V3, ResourceKind::Endpoint) => {
                "type.googleapis.com/envoy.config.endpoint.v3.ClusterLoadAssignment"
            }
            (EnvoyApiVersion::V3, ResourceKind::Cluster) => {
                "type.googleapis.com/envoy.config.cluster.v3.Cluster"
            }
            (EnvoyApiVersion::V3, ResourceKind::Route) => {
                "type.googleapis.com/envoy.config.route.v3.RouteConfiguration"
            }
            (EnvoyApiVersion::V3, ResourceKind::Listener) => {
                "type.googleapis.com/envoy.config.listener.v3.Listener"
            }
            (EnvoyApiVersion::V3, ResourceKind::Runtime) => {
                "type.googleapis.com/envoy.service.runtime.v3.Runtime"
            }
            (EnvoyApiVersion::V3, ResourceKind::Secret) => {
                "type.googleapis.com/envoy.extensions.transport_sockets.tls.v3.Secret"
            }
        }
    }

    /// Field of the resource document holding its name
    pub fn name_field(&self) -> &'static str {
        match self {
            ResourceKind::Endpoint => "cluster_name",
            _ => "name",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Endpoint => "endpoint",
            ResourceKind::Cluster => "cluster",
            ResourceKind::Route => "route",
            ResourceKind::Listener => "listener",
            ResourceKind::Runtime => "runtime",
            ResourceKind::Secret => "secret",
        };
        f.write_str(s)
    }
}

/// A declared resource after decoding, not yet validated
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedResource {
    pub name: String,
    pub value: serde_json::Value,
}

/// Structured form of a revision's declared resources
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceSet {
    pub resources: BTreeMap<ResourceKind, Vec<DecodedResource>>,
    /// Secrets are declared by reference and resolved at publish time
    pub secrets: Vec<EnvoySecretResource>,
}

/// A resource ready for the serving cache
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GeneratedResource {
    pub name: String,
    pub type_url: String,
    pub body: serde_json::Value,
}

/// Output of resource generation
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GeneratedResources {
    pub resources: BTreeMap<ResourceKind, Vec<GeneratedResource>>,
    /// Secret references still to be resolved against the secret source
    #[serde(skip)]
    pub secret_refs: Vec<EnvoySecretResource>,
}

impl GeneratedResources {
    pub fn push(&mut self, kind: ResourceKind, resource: GeneratedResource) {
        self.resources.entry(kind).or_default().push(resource);
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.resources.get(&kind).map(Vec::len).unwrap_or(0)
    }
}
