//! Lookup of EnvoyConfigRevisions by node ID and version

use kube::ResourceExt;
use tracing::debug;

use super::filters::{selector_for, RevisionFilter};
use super::store::RevisionStore;
use crate::crd::EnvoyConfigRevision;
use crate::error::{Error, Result};

/// Lists the revisions in `namespace` matching all `filters`.
///
/// Returns an empty list when nothing matches.
pub async fn list(
    store: &dyn RevisionStore,
    namespace: &str,
    filters: &[&dyn RevisionFilter],
) -> Result<Vec<EnvoyConfigRevision>> {
    let selector = selector_for(filters);
    let mut revisions = store.list(namespace, &selector).await?;

    // Only exact label matches inside the requested namespace
    revisions.retain(|r| {
        r.namespace().as_deref() == Some(namespace) && selector.matches(r.metadata.labels.as_ref())
    });

    debug!(
        "Found {} EnvoyConfigRevisions in {} matching '{}'",
        revisions.len(),
        namespace,
        selector
    );
    Ok(revisions)
}

/// Returns the single revision in `namespace` matching all `filters`.
///
/// Fails with `Error::NotFound` when nothing matches and with
/// `Error::AmbiguousResult` when more than one revision does.
pub async fn get(
    store: &dyn RevisionStore,
    namespace: &str,
    filters: &[&dyn RevisionFilter],
) -> Result<EnvoyConfigRevision> {
    let mut revisions = list(store, namespace, filters).await?;

    match revisions.len() {
        0 => Err(Error::NotFound(format!(
            "no EnvoyConfigRevision in {} matches '{}'",
            namespace,
            selector_for(filters)
        ))),
        1 => Ok(revisions.remove(0)),
        n => Err(Error::AmbiguousResult(format!(
            "{} EnvoyConfigRevisions in {} match '{}': {}",
            n,
            namespace,
            selector_for(filters),
            revisions
                .iter()
                .map(|r| r.name_any())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::filters::{by_node_id, by_version};
    use crate::controller::testing::{revision_with_labels, MemoryRevisionStore};
    use crate::crd::{NODE_ID_LABEL, VERSION_LABEL};

    #[tokio::test]
    async fn test_list_by_node_id() {
        let store = MemoryRevisionStore::with(vec![
            revision_with_labels("ecr1", "test", &[(NODE_ID_LABEL, "test")]),
            revision_with_labels("ecr2", "test", &[(NODE_ID_LABEL, "test")]),
            revision_with_labels("ecr3", "test", &[(NODE_ID_LABEL, "other")]),
        ]);

        let got = list(&store, "test", &[&by_node_id("test")]).await.unwrap();
        assert_eq!(got.len(), 2);
    }

    #[tokio::test]
    async fn test_list_by_node_id_and_version() {
        let store = MemoryRevisionStore::with(vec![
            revision_with_labels("ecr1", "test", &[(NODE_ID_LABEL, "test"), (VERSION_LABEL, "1")]),
            revision_with_labels("ecr2", "test", &[(NODE_ID_LABEL, "test"), (VERSION_LABEL, "2")]),
            revision_with_labels("ecr3", "test", &[(NODE_ID_LABEL, "test"), (VERSION_LABEL, "3")]),
        ]);

        let got = list(&store, "test", &[&by_node_id("test"), &by_version("1")])
            .await
            .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name_any(), "ecr1");
    }

    #[tokio::test]
    async fn test_list_only_returns_same_namespace() {
        let store = MemoryRevisionStore::with(vec![
            revision_with_labels("ecr", "test", &[(NODE_ID_LABEL, "test")]),
            revision_with_labels("ecr", "other", &[(NODE_ID_LABEL, "test")]),
        ]);

        let got = list(&store, "test", &[&by_node_id("test")]).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].namespace().as_deref(), Some("test"));
    }

    #[tokio::test]
    async fn test_list_no_match_is_empty() {
        let store = MemoryRevisionStore::default();
        let got = list(&store, "test", &[&by_node_id("test")]).await.unwrap();
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn test_list_is_case_sensitive() {
        let store = MemoryRevisionStore::with(vec![revision_with_labels(
            "ecr1",
            "test",
            &[(NODE_ID_LABEL, "Test")],
        )]);

        let got = list(&store, "test", &[&by_node_id("test")]).await.unwrap();
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn test_get_single_match() {
        let expected =
            revision_with_labels("ecr1", "test", &[(NODE_ID_LABEL, "test"), (VERSION_LABEL, "1")]);
        let store = MemoryRevisionStore::with(vec![
            expected.clone(),
            revision_with_labels("ecr2", "test", &[(NODE_ID_LABEL, "test"), (VERSION_LABEL, "2")]),
        ]);

        let got = get(&store, "test", &[&by_node_id("test"), &by_version("1")])
            .await
            .unwrap();
        assert_eq!(got.name_any(), expected.name_any());
        assert_eq!(got.metadata.labels, expected.metadata.labels);
    }

    #[tokio::test]
    async fn test_get_multiple_matches_is_ambiguous() {
        let store = MemoryRevisionStore::with(vec![
            revision_with_labels("ecr1", "test", &[(NODE_ID_LABEL, "test"), (VERSION_LABEL, "1")]),
            revision_with_labels("ecr2", "test", &[(NODE_ID_LABEL, "test"), (VERSION_LABEL, "1")]),
        ]);

        let err = get(&store, "test", &[&by_node_id("test"), &by_version("1")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousResult(_)));
    }

    #[tokio::test]
    async fn test_get_no_match_is_not_found() {
        let store = MemoryRevisionStore::default();
        let err = get(&store, "test", &[&by_node_id("test"), &by_version("1")])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_empty_filters_match_whole_namespace() {
        let store = MemoryRevisionStore::with(vec![
            revision_with_labels("ecr1", "test", &[(NODE_ID_LABEL, "a")]),
            revision_with_labels("ecr2", "test", &[]),
        ]);

        let got = tokio_test::block_on(list(&store, "test", &[]));
        let got = tokio_test::assert_ok!(got);
        assert_eq!(got.len(), 2);
    }
}
