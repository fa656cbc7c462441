//! Decoding of serialized resource payloads

use base64::Engine;
use thiserror::Error;

use super::{DecodedResource, ResourceKind, ResourceSet};
use crate::crd::{EnvoyResource, EnvoyResources, SerializationFormat};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("invalid base64 in {kind} '{name}': {reason}")]
    Base64 {
        kind: ResourceKind,
        name: String,
        reason: String,
    },

    #[error("failed to decode {kind} '{name}' as {format}: {reason}")]
    Syntax {
        kind: ResourceKind,
        name: String,
        format: SerializationFormat,
        reason: String,
    },
}

/// Turns a revision's declared resources into structured documents
pub trait ResourceDecoder: Send + Sync {
    fn decode(
        &self,
        resources: &EnvoyResources,
        format: SerializationFormat,
    ) -> Result<ResourceSet, DecodeError>;
}

/// Decoder backed by `serde_json` and `serde_yaml`
#[derive(Clone, Debug, Default)]
pub struct SerdeDecoder;

impl SerdeDecoder {
    fn decode_one(
        kind: ResourceKind,
        resource: &EnvoyResource,
        format: SerializationFormat,
    ) -> Result<DecodedResource, DecodeError> {
        let syntax = |reason: String| DecodeError::Syntax {
            kind,
            name: resource.name.clone(),
            format,
            reason,
        };

        let value = match format {
            SerializationFormat::Json => {
                serde_json::from_str(&resource.value).map_err(|e| syntax(e.to_string()))?
            }
            SerializationFormat::B64json => {
                let raw = base64::engine::general_purpose::STANDARD
                    .decode(resource.value.trim())
                    .map_err(|e| DecodeError::Base64 {
                        kind,
                        name: resource.name.clone(),
                        reason: e.to_string(),
                    })?;
                serde_json::from_slice(&raw).map_err(|e| syntax(e.to_string()))?
            }
            SerializationFormat::Yaml => {
                serde_yaml::from_str(&resource.value).map_err(|e| syntax(e.to_string()))?
            }
        };

        Ok(DecodedResource {
            name: resource.name.clone(),
            value,
        })
    }
}

impl ResourceDecoder for SerdeDecoder {
    fn decode(
        &self,
        resources: &EnvoyResources,
        format: SerializationFormat,
    ) -> Result<ResourceSet, DecodeError> {
        let declared = [
            (ResourceKind::Endpoint, &resources.endpoints),
            (ResourceKind::Cluster, &resources.clusters),
            (ResourceKind::Route, &resources.routes),
            (ResourceKind::Listener, &resources.listeners),
            (ResourceKind::Runtime, &resources.runtimes),
        ];

        let mut set = ResourceSet::default();
        for (kind, list) in declared {
            for resource in list {
                let decoded = Self::decode_one(kind, resource, format)?;
                set.resources.entry(kind).or_default().push(decoded);
            }
        }
        set.secrets = resources.secrets.clone();

        Ok(set)
    }
}
