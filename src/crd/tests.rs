//! Unit tests for the EnvoyConfigRevision resource model
//!
//! Tests that manifests written by users deserialize into the expected spec,
//! that undeclared settings fall back to their defaults, and that the
//! generated CRD carries the expected identity.

#[cfg(test)]
mod envoy_config_revision {
    use crate::crd::{
        EnvoyApiVersion, EnvoyConfigRevision, EnvoyConfigRevisionStatus, SerializationFormat,
    };
    use kube::CustomResourceExt;

    const MANIFEST: &str = r#"
apiVersion: marin3r.3scale.net/v1alpha1
kind: EnvoyConfigRevision
metadata:
  name: ecr-node1-v1
  namespace: default
spec:
  nodeID: node1
  version: v1
  envoyAPI: v3
  serialization: yaml
  envoyResources:
    clusters:
      - name: cluster1
        value: |
          name: cluster1
          connect_timeout: 2s
    secrets:
      - name: cert
        ref:
          name: tls-secret
          namespace: certs
"#;

    #[test]
    fn test_manifest_deserializes() {
        let rev: EnvoyConfigRevision = serde_yaml::from_str(MANIFEST).unwrap();

        assert_eq!(rev.spec.node_id, "node1");
        assert_eq!(rev.spec.version, "v1");
        assert_eq!(rev.envoy_api(), EnvoyApiVersion::V3);
        assert_eq!(rev.serialization(), SerializationFormat::Yaml);
        assert_eq!(rev.spec.envoy_resources.clusters.len(), 1);
        assert!(rev.spec.envoy_resources.listeners.is_empty());

        let secret = &rev.spec.envoy_resources.secrets[0];
        assert_eq!(secret.secret_ref.name, "tls-secret");
        assert_eq!(secret.secret_ref.namespace.as_deref(), Some("certs"));
    }

    #[test]
    fn test_undeclared_settings_use_defaults() {
        let rev: EnvoyConfigRevision = serde_json::from_value(serde_json::json!({
            "apiVersion": "marin3r.3scale.net/v1alpha1",
            "kind": "EnvoyConfigRevision",
            "metadata": { "name": "ecr", "namespace": "default" },
            "spec": { "nodeID": "node1", "version": "v1" }
        }))
        .unwrap();

        assert_eq!(rev.spec.envoy_api, None);
        assert_eq!(rev.envoy_api(), EnvoyApiVersion::V2);
        assert_eq!(rev.serialization(), SerializationFormat::Json);
        assert!(rev.conditions().is_empty());
    }

    #[test]
    fn test_unknown_api_version_is_rejected() {
        let result: Result<EnvoyConfigRevision, _> = serde_json::from_value(serde_json::json!({
            "apiVersion": "marin3r.3scale.net/v1alpha1",
            "kind": "EnvoyConfigRevision",
            "metadata": { "name": "ecr" },
            "spec": { "nodeID": "node1", "version": "v1", "envoyAPI": "v4" }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_status_field_names() {
        let status = EnvoyConfigRevisionStatus {
            published: true,
            last_published_at: Some("2024-01-01T00:00:00+00:00".to_string()),
            tainted: false,
            conditions: vec![],
        };

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["published"], true);
        assert_eq!(value["lastPublishedAt"], "2024-01-01T00:00:00+00:00");
        assert_eq!(value["tainted"], false);
    }

    #[test]
    fn test_crd_identity() {
        let crd = EnvoyConfigRevision::crd();

        assert_eq!(crd.spec.group, "marin3r.3scale.net");
        assert_eq!(crd.spec.names.kind, "EnvoyConfigRevision");
        assert_eq!(crd.spec.scope, "Namespaced");
        assert_eq!(crd.spec.versions[0].name, "v1alpha1");
    }
}
