//! Retrieval of TLS material referenced by revisions
//!
//! Secrets live in the Kubernetes API and may briefly be missing or
//! unreadable, so every retrieval failure is reported as a dependency error
//! and never taints the revision.
//!
//! Only secret **names** are logged, never their contents.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{api::Api, Client};
use tracing::debug;

use crate::cache::CacheError;

const TLS_CERT_KEY: &str = "tls.crt";
const TLS_KEY_KEY: &str = "tls.key";

/// PEM encoded certificate chain and private key
#[derive(Clone, PartialEq)]
pub struct TlsMaterial {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
}

impl std::fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("cert_pem", &format_args!("<{} bytes>", self.cert_pem.len()))
            .field("key_pem", &"<redacted>")
            .finish()
    }
}

#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn tls_material(&self, namespace: &str, name: &str) -> Result<TlsMaterial, CacheError>;
}

/// Reads `kubernetes.io/tls` Secrets from the API server
#[derive(Clone)]
pub struct KubeSecretSource {
    client: Client,
}

impl KubeSecretSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretSource for KubeSecretSource {
    async fn tls_material(&self, namespace: &str, name: &str) -> Result<TlsMaterial, CacheError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = api.get(name).await.map_err(|e| {
            CacheError::Dependency(format!("unable to get secret {namespace}/{name}: {e}"))
        })?;

        let data = secret.data.unwrap_or_default();
        let field = |key: &str| {
            data.get(key).map(|v| v.0.clone()).ok_or_else(|| {
                CacheError::Dependency(format!("secret {namespace}/{name} has no '{key}' key"))
            })
        };

        let material = TlsMaterial {
            cert_pem: field(TLS_CERT_KEY)?,
            key_pem: field(TLS_KEY_KEY)?,
        };
        debug!("Loaded TLS material from secret {}/{}", namespace, name);
        Ok(material)
    }
}
