//! Citation Lifecycle Integration Tests
//!
//! Drives the full extension flow through the public API: capture nodes,
//! rearrange the hierarchy, soft-delete, heal structural damage, and push
//! the result to the remote store. Verifies the write-origin tagging that
//! keeps the reload/sync feedback loops from forming.

mod citation_lifecycle_tests {
    use citetree_core::auth::StaticAuthProvider;
    use citetree_core::models::CitationTree;
    use citetree_core::services::tree_service::NewCitation;
    use citetree_core::storage::{
        LocalStore, MemoryKeyValueStore, MemoryRemoteStore, StoreEvent, WriteOrigin,
    };
    use citetree_core::{RepairService, SyncEngine, SyncOutcome, TreeService};
    use std::sync::Arc;

    fn citation(text: &str) -> NewCitation {
        NewCitation {
            text: text.to_string(),
            url: Some(format!("https://example.com/{text}")),
            title: Some(text.to_string()),
        }
    }

    /// Capture log output per test; `RUST_LOG` filters apply.
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn service() -> (TreeService, Arc<LocalStore>) {
        init_tracing();
        let store = Arc::new(LocalStore::new(Arc::new(MemoryKeyValueStore::new())));
        (TreeService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_capture_chain_builds_hierarchy_under_current_node() {
        let (service, store) = service();

        // Each capture lands under the previous one (the current node)
        let root = service.capture_node(citation("root")).await.unwrap();
        let child = service.capture_node(citation("child")).await.unwrap();
        let grandchild = service.capture_node(citation("grandchild")).await.unwrap();

        let tree = store.load_tree().await.unwrap();
        assert_eq!(tree.current_node_id, Some(grandchild));
        assert_eq!(tree.node(child).unwrap().parent_id, Some(root));
        assert_eq!(tree.node(grandchild).unwrap().parent_id, Some(child));
        assert_eq!(tree.node(root).unwrap().children, vec![child]);
        // Ids come from the persistent counter, so they never collide even
        // across deletions
        assert!(store.load_node_counter().await.unwrap() > grandchild);
    }

    #[tokio::test]
    async fn test_content_edits_stamp_last_modified_but_highlight_does_not() {
        let (service, store) = service();

        let root = service.capture_node(citation("root")).await.unwrap();
        let stamped = store.last_modified().await.unwrap();
        assert!(stamped.is_some());

        // Highlight-only change: no content moved, so the sync timestamp
        // must not advance
        assert!(service.set_current_node(root).await);
        assert_eq!(store.last_modified().await.unwrap(), stamped);
    }

    #[tokio::test]
    async fn test_write_origins_across_the_lifecycle() {
        let (service, store) = service();
        let mut events = store.subscribe();

        let root = service.capture_node(citation("root")).await.unwrap();
        let child = service.capture_node(citation("child")).await.unwrap();
        assert!(service.move_node_to_root(child).await);
        assert!(service.set_current_node(root).await);

        let mut origins = Vec::new();
        for _ in 0..4 {
            let StoreEvent::TreeWritten { origin, .. } = events.try_recv().unwrap();
            origins.push(origin);
        }
        assert_eq!(
            origins,
            vec![
                WriteOrigin::Content,
                WriteOrigin::Content,
                WriteOrigin::Content,
                WriteOrigin::UiOnly,
            ]
        );
    }

    #[tokio::test]
    async fn test_soft_delete_hides_subtree_without_freeing_ids() {
        let (service, store) = service();

        let root = service.capture_node(citation("root")).await.unwrap();
        let child = service.capture_node(citation("child")).await.unwrap();

        assert!(service.delete_node(root).await);

        let tree = store.load_tree().await.unwrap();
        // Nodes stay in the vector, just marked deleted
        assert_eq!(tree.nodes.len(), 2);
        assert!(tree.node(root).unwrap().deleted);
        assert!(tree.node(child).unwrap().deleted);
        assert_eq!(tree.current_node_id, None);

        // The next capture lands at root with a fresh id
        let revived = service.capture_node(citation("fresh")).await.unwrap();
        assert!(revived > child);
        let tree = store.load_tree().await.unwrap();
        assert_eq!(tree.node(revived).unwrap().parent_id, None);
    }

    #[tokio::test]
    async fn test_annotation_and_image_round_trip_through_storage() {
        let (service, store) = service();

        let node = service.capture_node(citation("annotated")).await.unwrap();
        let annotation_id = service
            .add_annotation(node, "a note".to_string(), None)
            .await
            .unwrap();
        assert_eq!(annotation_id, 1);
        assert!(service.add_image(node, "data:image/png;base64,AAAA".to_string()).await);

        let tree = store.load_tree().await.unwrap();
        let node = tree.node(node).unwrap();
        assert_eq!(node.annotations[0].text, "a note");
        assert_eq!(node.images[0].src, "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    async fn test_repair_heals_damage_left_by_a_lost_write() {
        let (service, store) = service();
        let auth: Arc<StaticAuthProvider> =
            Arc::new(StaticAuthProvider::logged_in("u1", None));

        let root = service.capture_node(citation("root")).await.unwrap();
        let child = service.capture_node(citation("child")).await.unwrap();

        // Simulate a clobbered write: the child's parent link survived but
        // the parent's children array lost it, and a stale pointer remains
        let mut tree = store.load_tree().await.unwrap();
        tree.node_mut(root).unwrap().children.clear();
        tree.current_node_id = Some(9999);
        store.save_tree(&tree, WriteOrigin::Content).await.unwrap();

        let repair = RepairService::new(store.clone(), auth);
        let result = repair.repair_and_persist().await;
        assert!(result.repaired);

        let healed = store.load_tree().await.unwrap();
        assert_eq!(healed.node(root).unwrap().children, vec![child]);
        assert_eq!(healed.current_node_id, None);

        // Healed state is a fixed point
        let again = repair.repair_and_persist().await;
        assert!(!again.repaired);
    }

    #[tokio::test]
    async fn test_captured_work_flows_to_the_remote_store() {
        let (service, store) = service();
        let remote = Arc::new(MemoryRemoteStore::new());
        let auth: Arc<StaticAuthProvider> =
            Arc::new(StaticAuthProvider::logged_in("u1", Some("u1@example.com".to_string())));
        let engine = SyncEngine::new(store.clone(), remote.clone(), auth);

        let root = service.capture_node(citation("root")).await.unwrap();
        service
            .add_annotation(root, "remember this".to_string(), None)
            .await
            .unwrap();

        assert_eq!(engine.perform_sync().await.unwrap(), SyncOutcome::Uploaded);

        let document = remote.document("u1").await.unwrap();
        let uploaded: CitationTree =
            serde_json::from_value(document.get("citationTree").unwrap().clone()).unwrap();
        assert_eq!(uploaded, store.load_tree().await.unwrap());
        assert_eq!(
            document.get("nodeCounter").unwrap().as_u64().unwrap(),
            store.load_node_counter().await.unwrap()
        );

        // Nothing changed since the upload: the next cycle is a no-op
        assert_eq!(engine.perform_sync().await.unwrap(), SyncOutcome::UpToDate);
    }
}
