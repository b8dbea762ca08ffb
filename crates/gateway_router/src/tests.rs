// End-to-end gateway scenarios: login, relay, logout.
#[cfg(test)]
mod tests {
    use crate::memory::{InMemoryNodeRegistry, InMemoryTokenStore, RecordingClientTransport};
    use crate::*;
    use futures::future::join_all;
    use std::sync::Arc;

    struct Harness {
        registry: Arc<InMemoryNodeRegistry>,
        store: Arc<InMemoryTokenStore>,
        transport: Arc<RecordingClientTransport>,
        gateway: Arc<Gateway>,
    }

    fn harness_with(config: RouterConfig) -> Harness {
        let registry = Arc::new(InMemoryNodeRegistry::new());
        let store = Arc::new(InMemoryTokenStore::new());
        let transport = Arc::new(RecordingClientTransport::new());
        let gateway = Gateway::builder(config)
            .node_registry(registry.clone())
            .token_store(store.clone())
            .client_transport(transport.clone())
            .build()
            .expect("Failed to build gateway");
        Harness {
            registry,
            store,
            transport,
            gateway: Arc::new(gateway),
        }
    }

    fn harness() -> Harness {
        let mut config = RouterConfig::new(1000);
        config.namespace.node_type_size = 5;
        harness_with(config)
    }

    fn token(credential: &str, allocations: &[(ServiceType, u32)]) -> TokenRecord {
        TokenRecord {
            credential: credential.to_string(),
            allocations: allocations
                .iter()
                .map(|&(service_type, server_id)| Allocation {
                    service_type,
                    server_id,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_verified_allocation_routes_to_exact_node() {
        let h = harness();
        for instance in 1..=3 {
            h.registry.register(NodeId::new(2, instance));
        }
        h.store.insert("alice", token("secret", &[(2, 3)]));

        assert_eq!(h.gateway.verify_token("alice", "secret").await.code(), 0);
        for _ in 0..5 {
            assert!(h.gateway.on_recv_from_client("alice", 2001, b"move").await);
        }

        let sent = h.registry.sent_messages().await;
        assert_eq!(sent.len(), 5);
        assert!(sent.iter().all(|(node, _, _)| *node == NodeId::new(2, 3)));
        assert!(sent
            .iter()
            .all(|(_, _, envelope)| envelope.cmd == 1 && envelope.data == b"move"));
    }

    #[tokio::test]
    async fn test_reserved_service_type_scenario() {
        let h = harness();
        h.registry.register(NodeId::new(0, 1));

        // 42 decodes to the gateway's own type 0.
        assert!(!h.gateway.on_recv_from_client("alice", 42, b"x").await);
        // 5001 decodes to type 5, which equals node_type_size.
        assert!(!h.gateway.on_recv_from_client("alice", 5001, b"x").await);
        assert!(h.registry.sent_messages().await.is_empty());
        assert_eq!(h.gateway.stats().protocol_errors, 2);
    }

    #[tokio::test]
    async fn test_unknown_account_without_live_node_is_routing_miss() {
        let h = harness();
        h.registry.register(NodeId::new(2, 1));

        let result = h.gateway.dispatcher().dispatch("alice", 3001, b"x").await;
        assert!(matches!(
            result,
            Err(RouterError::RoutingMiss {
                service_type: 3,
                reason: RouteMiss::UnknownAccount,
                ..
            })
        ));
        assert!(h.registry.sent_messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_account_miss_differs_from_known_account_miss() {
        let h = harness();
        h.store.insert("known", token("pw", &[(2, 1)]));
        h.gateway.verify_token("known", "pw").await;

        let known = h.gateway.dispatcher().dispatch("known", 3001, b"x").await;
        let unknown = h.gateway.dispatcher().dispatch("stranger", 3001, b"x").await;
        assert!(matches!(
            known,
            Err(RouterError::RoutingMiss {
                reason: RouteMiss::NoLiveNode,
                ..
            })
        ));
        assert!(matches!(
            unknown,
            Err(RouterError::RoutingMiss {
                reason: RouteMiss::UnknownAccount,
                ..
            })
        ));

        let stats = h.gateway.stats();
        assert_eq!(stats.routing_misses, 2);
        assert_eq!(stats.unknown_accounts, 1);
    }

    #[tokio::test]
    async fn test_unknown_account_with_live_node_is_relayed() {
        let h = harness();
        h.registry.register(NodeId::new(3, 1));

        assert!(h.gateway.on_recv_from_client("stranger", 3007, b"x").await);
        let sent = h.registry.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.service_type(), 3);
        assert_eq!(sent[0].2.cmd, 7);
        assert_eq!(h.gateway.stats().unknown_accounts, 1);
    }

    #[tokio::test]
    async fn test_logout_never_leaves_stale_route() {
        let h = harness();
        let pinned = NodeId::new(2, 1);
        h.registry.register(pinned);
        h.store.insert("carol", token("pw", &[(2, 1)]));
        assert!(h.gateway.verify_token("carol", "pw").await.is_success());
        assert!(h.gateway.on_recv_from_client("carol", 2001, b"x").await);

        h.gateway.on_logout("carol").await;
        h.registry.deregister(&pinned);

        let result = h.gateway.dispatcher().dispatch("carol", 2001, b"x").await;
        assert!(matches!(
            result,
            Err(RouterError::RoutingMiss {
                reason: RouteMiss::UnknownAccount,
                ..
            })
        ));
        assert_eq!(h.registry.sent_messages().await.len(), 1);
        assert_eq!(
            h.gateway.affinity().lookup("carol", 2).await,
            AffinityLookup::UnknownAccount
        );
    }

    #[tokio::test]
    async fn test_failed_verification_keeps_existing_route() {
        let h = harness();
        h.registry.register(NodeId::new(2, 1));
        h.registry.register(NodeId::new(2, 2));
        h.store.insert("dave", token("pw", &[(2, 2)]));
        h.gateway.verify_token("dave", "pw").await;

        assert_eq!(
            h.gateway.verify_token("dave", "wrong").await,
            VerifyOutcome::CredentialMismatch
        );
        let node = h.gateway.dispatcher().dispatch("dave", 2001, b"x").await.unwrap();
        assert_eq!(node, NodeId::new(2, 2));
    }

    #[tokio::test]
    async fn test_store_outage_reports_code_two() {
        let h = harness();
        h.store.set_unavailable(true);
        assert_eq!(h.gateway.verify_token("erin", "pw").await.code(), 2);
        assert!(h.gateway.affinity().is_empty().await);
    }

    #[tokio::test]
    async fn test_stale_sticky_node_policy_is_configurable() {
        let mut config = RouterConfig::new(1000);
        config.routing.stale_affinity = StaleAffinityPolicy::Fallback;
        let h = harness_with(config);
        h.registry.register(NodeId::new(2, 1));
        h.registry.register(NodeId::new(2, 2));
        h.store.insert("frank", token("pw", &[(2, 1)]));
        h.gateway.verify_token("frank", "pw").await;

        h.registry.mark_down(&NodeId::new(2, 1));
        let node = h.gateway.dispatcher().dispatch("frank", 2001, b"x").await.unwrap();
        assert_eq!(node, NodeId::new(2, 2));

        let strict = harness();
        strict.registry.register(NodeId::new(2, 1));
        strict.registry.register(NodeId::new(2, 2));
        strict.store.insert("frank", token("pw", &[(2, 1)]));
        strict.gateway.verify_token("frank", "pw").await;

        strict.registry.mark_down(&NodeId::new(2, 1));
        assert!(strict.gateway.on_recv_from_client("frank", 2001, b"x").await);
        assert!(strict.registry.sent_messages().await.is_empty());
        assert_eq!(strict.gateway.stats().routing_misses, 1);
    }

    #[tokio::test]
    async fn test_frame_decode_hook_strips_trailer() {
        let h = harness();
        h.registry.register(NodeId::new(2, 1));

        let frame = PassthroughCodec.encode(2001, b"body").unwrap().into_bytes();
        assert!(h.gateway.on_recv_frame("alice", 2001, &frame).await);
        assert!(!h.gateway.on_recv_frame("alice", 2001, &[]).await);

        let sent = h.registry.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].2.data, b"body");
    }

    #[tokio::test]
    async fn test_backend_push_reaches_client() {
        let h = harness();
        h.transport.connect("alice").await;

        h.gateway
            .send_to_client("alice", 17, &serde_json::json!({"gold": 5}))
            .await
            .expect("alice is connected");
        h.gateway.broadcast_to_clients(18, "server restart").await.unwrap();

        let sent = h.transport.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1, 17);
        assert_eq!(sent[1].0, None);

        h.transport.disconnect("alice").await;
        assert!(h.gateway.send_to_client("alice", 17, "late").await.is_err());
        assert!(matches!(
            h.gateway.send_to_role("Paladin", 17, "hi").await,
            Err(RouterError::UnknownRole(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_relays_during_reassignment() {
        let h = harness();
        for instance in 1..=2 {
            h.registry.register(NodeId::new(2, instance));
            h.registry.register(NodeId::new(3, instance));
        }
        h.store.insert("bob", token("old", &[(2, 1), (3, 1)]));
        h.gateway.verify_token("bob", "old").await;
        h.store.insert("bob", token("new", &[(2, 2), (3, 2)]));

        let mut tasks = Vec::new();
        for i in 0..100u32 {
            let gateway = h.gateway.clone();
            tasks.push(tokio::spawn(async move {
                if i == 50 {
                    gateway.verify_token("bob", "new").await;
                }
                let snapshot = gateway.affinity().snapshot("bob").await.expect("bob is known");
                let service_type = 2 + (i % 2);
                let routed = gateway
                    .dispatcher()
                    .dispatch("bob", service_type * 1000 + i, b"x")
                    .await
                    .expect("bob has live pinned nodes");
                (snapshot[&2].instance(), snapshot[&3].instance(), routed)
            }));
        }

        for result in join_all(tasks).await {
            let (world, chat, routed) = result.expect("relay task panicked");
            assert_eq!(world, chat, "observed a half-written allocation set");
            assert!(routed.instance() == 1 || routed.instance() == 2);
        }
        assert_eq!(h.gateway.stats().relayed, 100);
    }
}
