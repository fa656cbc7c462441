//! Generation of cache-ready resources from decoded documents

use base64::Engine;
use serde_json::{json, Map, Value};
use thiserror::Error;

use super::{GeneratedResource, GeneratedResources, ResourceKind, ResourceSet};
use crate::crd::EnvoyApiVersion;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("{kind} '{name}' is not an object")]
    NotAnObject { kind: ResourceKind, name: String },

    #[error("{kind} '{name}' declares {field} '{found}'")]
    NameMismatch {
        kind: ResourceKind,
        name: String,
        field: &'static str,
        found: String,
    },

    #[error("{kind} resource declared with an empty name")]
    EmptyName { kind: ResourceKind },
}

/// Builds the concrete resources for the target proxy model
pub trait ResourceGenerator: Send + Sync {
    fn generate(&self, set: ResourceSet) -> Result<GeneratedResources, GenerationError>;

    /// Builds a TLS certificate secret resource from PEM material
    fn secret_resource(&self, name: &str, cert_pem: &[u8], key_pem: &[u8]) -> GeneratedResource;
}

/// Generator for Envoy xDS resources of a fixed API version
#[derive(Clone, Debug)]
pub struct EnvoyGenerator {
    api: EnvoyApiVersion,
}

impl EnvoyGenerator {
    pub fn new(api: EnvoyApiVersion) -> Self {
        Self { api }
    }

    pub fn api(&self) -> EnvoyApiVersion {
        self.api
    }
}

impl ResourceGenerator for EnvoyGenerator {
    fn generate(&self, set: ResourceSet) -> Result<GeneratedResources, GenerationError> {
        let mut generated = GeneratedResources::default();

        for (kind, resources) in set.resources {
            let field = kind.name_field();
            for resource in resources {
                if resource.name.is_empty() {
                    return Err(GenerationError::EmptyName { kind });
                }

                let mut body: Map<String, Value> = match resource.value {
                    Value::Object(map) => map,
                    _ => {
                        return Err(GenerationError::NotAnObject {
                            kind,
                            name: resource.name,
                        })
                    }
                };

                // A missing name field inherits the declared one
                match body.get(field) {
                    None => {
                        body.insert(field.to_string(), Value::String(resource.name.clone()));
                    }
                    Some(Value::String(found)) if *found == resource.name => {}
                    Some(other) => {
                        let found = other
                            .as_str()
                            .map(str::to_string)
                            .unwrap_or_else(|| other.to_string());
                        return Err(GenerationError::NameMismatch {
                            kind,
                            name: resource.name,
                            field,
                            found,
                        });
                    }
                }

                generated.push(
                    kind,
                    GeneratedResource {
                        name: resource.name,
                        type_url: kind.type_url(self.api).to_string(),
                        body: Value::Object(body),
                    },
                );
            }
        }

        generated.secret_refs = set.secrets;
        Ok(generated)
    }

    fn secret_resource(&self, name: &str, cert_pem: &[u8], key_pem: &[u8]) -> GeneratedResource {
        let b64 = base64::engine::general_purpose::STANDARD;
        GeneratedResource {
            name: name.to_string(),
            type_url: ResourceKind::Secret.type_url(self.api).to_string(),
            body: json!({
                "name": name,
                "tls_certificate": {
                    "certificate_chain": { "inline_bytes": b64.encode(cert_pem) },
                    "private_key": { "inline_bytes": b64.encode(key_pem) },
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envoy::DecodedResource;

    fn set_with(kind: ResourceKind, name: &str, value: Value) -> ResourceSet {
        let mut set = ResourceSet::default();
        set.resources.insert(
            kind,
            vec![DecodedResource {
                name: name.to_string(),
                value,
            }],
        );
        set
    }

    #[test]
    fn test_generate_stamps_type_url() {
        let generator = EnvoyGenerator::new(EnvoyApiVersion::V3);
        let out = generator
            .generate(set_with(
                ResourceKind::Cluster,
                "cluster1",
                json!({"name": "cluster1"}),
            ))
            .unwrap();

        let cluster = &out.resources[&ResourceKind::Cluster][0];
        assert_eq!(
            cluster.type_url,
            "type.googleapis.com/envoy.config.cluster.v3.Cluster"
        );
    }

    #[test]
    fn test_endpoint_uses_cluster_name_field() {
        let generator = EnvoyGenerator::new(EnvoyApiVersion::V2);
        let out = generator
            .generate(set_with(ResourceKind::Endpoint, "backend", json!({})))
            .unwrap();

        assert_eq!(
            out.resources[&ResourceKind::Endpoint][0].body["cluster_name"],
            "backend"
        );
    }

    #[test]
    fn test_name_mismatch_fails() {
        let generator = EnvoyGenerator::new(EnvoyApiVersion::V3);
        let err = generator
            .generate(set_with(
                ResourceKind::Listener,
                "http",
                json!({"name": "https"}),
            ))
            .unwrap_err();

        assert!(matches!(err, GenerationError::NameMismatch { .. }));
    }

    #[test]
    fn test_non_object_fails() {
        let generator = EnvoyGenerator::new(EnvoyApiVersion::V3);
        let err = generator
            .generate(set_with(ResourceKind::Route, "local", json!([1, 2])))
            .unwrap_err();

        assert_eq!(
            err,
            GenerationError::NotAnObject {
                kind: ResourceKind::Route,
                name: "local".to_string()
            }
        );
    }

    #[test]
    fn test_secret_resource_inlines_pem() {
        let generator = EnvoyGenerator::new(EnvoyApiVersion::V3);
        let secret = generator.secret_resource("cert", b"CERT", b"KEY");

        assert_eq!(
            secret.body["tls_certificate"]["certificate_chain"]["inline_bytes"],
            "Q0VSVA=="
        );
        assert!(secret.type_url.ends_with("tls.v3.Secret"));
    }
}
