use live_activity::activities::{DeliveryAttributes, DeliveryState, DeliveryStatus, DeliveryTracking};
use live_activity::{
    ActivityError, ActivityStatus, DismissalPolicy, InMemoryHost, LiveActivityEngine, StartConfig,
};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn engine_with_host() -> (Arc<InMemoryHost>, LiveActivityEngine) {
    init_test_tracing();
    let (host, events) = InMemoryHost::new();
    let host = Arc::new(host);
    let engine = LiveActivityEngine::new(host.clone(), events);
    (host, engine)
}

fn delivery_config() -> StartConfig {
    StartConfig::new(
        "delivery",
        serde_json::json!({"orderId": "42"}),
        serde_json::json!({"eta": "10:00"}),
    )
    .with_relevance_score(1.0)
}

#[tokio::test]
async fn test_delivery_scenario_end_to_end() {
    let (_host, engine) = engine_with_host();

    // Start
    let id = engine.start(delivery_config()).await.unwrap();
    let active = engine.list_active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id(), id);
    assert_eq!(active[0].status(), ActivityStatus::Active);

    // Update
    engine
        .update(id, serde_json::json!({"eta": "10:15"}), None, None)
        .await
        .unwrap();
    assert_eq!(
        engine.list_active()[0].content_state(),
        &serde_json::json!({"eta": "10:15"})
    );

    // End with final content and immediate dismissal
    engine
        .end(
            id,
            Some(serde_json::json!({"eta": "delivered"})),
            DismissalPolicy::Immediate,
        )
        .await
        .unwrap();

    assert!(engine.list_active().is_empty());
    assert_eq!(engine.get_push_token(id), None);
}

#[tokio::test]
async fn test_ids_are_never_reused() {
    let (_host, engine) = engine_with_host();
    let mut seen = HashSet::new();

    for _ in 0..10 {
        let id = engine.start(delivery_config()).await.unwrap();
        assert!(seen.insert(id), "id {} was reused", id);
        engine
            .end(id, None, DismissalPolicy::Immediate)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_list_active_preserves_creation_order() {
    let (_host, engine) = engine_with_host();

    let first = engine.start(delivery_config()).await.unwrap();
    let second = engine.start(delivery_config()).await.unwrap();
    let third = engine.start(delivery_config()).await.unwrap();

    let listed: Vec<_> = engine.list_active().iter().map(|a| a.id()).collect();
    assert_eq!(listed, vec![first, second, third]);
}

#[tokio::test]
async fn test_updates_apply_in_call_order() {
    let (_host, engine) = engine_with_host();
    let id = engine.start(delivery_config()).await.unwrap();

    // Two updates issued in order against the same id; per-id FIFO locking
    // makes the second one win regardless of host latency
    let (a, b) = tokio::join!(
        engine.update(id, serde_json::json!({"eta": "A"}), None, None),
        engine.update(id, serde_json::json!({"eta": "B"}), None, None),
    );
    a.unwrap();
    b.unwrap();

    // Last write by call order, never a merge
    assert_eq!(
        engine.list_active()[0].content_state(),
        &serde_json::json!({"eta": "B"})
    );
}

#[tokio::test]
async fn test_end_all_collects_partial_failures() {
    let (host, engine) = engine_with_host();

    let first = engine
        .start(StartConfig::new(
            "a",
            serde_json::json!({}),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    let second = engine
        .start(StartConfig::new(
            "b",
            serde_json::json!({}),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    let third = engine
        .start(StartConfig::new(
            "c",
            serde_json::json!({}),
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    // The second activity's teardown fails externally
    let handle = host.handle_for_type("b").unwrap();
    host.fail_teardown_for(&handle);

    let report = engine.end_all().await;

    assert!(!report.is_all_ok());
    assert_eq!(report.succeeded(), vec![first, third]);
    assert_eq!(report.failed(), vec![second]);

    // The failed activity is still active and can be retried
    let still_active: Vec<_> = engine
        .list_active()
        .iter()
        .filter(|a| a.status() == ActivityStatus::Active)
        .map(|a| a.id())
        .collect();
    assert_eq!(still_active, vec![second]);

    engine
        .end(second, None, DismissalPolicy::Immediate)
        .await
        .unwrap();

    // First and third linger in Ending until the host confirms their
    // deferred teardowns; the retried second is gone immediately
    let remaining: Vec<_> = engine.list_active().iter().map(|a| a.id()).collect();
    assert_eq!(remaining, vec![first, third]);
    assert!(engine
        .list_active()
        .iter()
        .all(|a| a.status() == ActivityStatus::Ending));
}

#[tokio::test]
async fn test_deferred_dismissal_retains_entry_until_confirmed() {
    let (host, engine) = engine_with_host();
    let id = engine.start(delivery_config()).await.unwrap();
    let handle = host.handle_for_type("delivery").unwrap();

    let dismiss_at = Utc::now() + chrono::Duration::minutes(5);
    engine
        .end(id, None, DismissalPolicy::After(dismiss_at))
        .await
        .unwrap();

    // Still enumerable while the host retains the surface
    let active = engine.list_active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].status(), ActivityStatus::Ending);
    assert_eq!(
        active[0].dismissal_policy(),
        Some(&DismissalPolicy::After(dismiss_at))
    );

    // Host confirms teardown; the next read drops the entry
    host.confirm_teardown(&handle);
    assert!(engine.list_active().is_empty());
}

#[tokio::test]
async fn test_push_token_arrives_asynchronously() {
    let (host, engine) = engine_with_host();
    let id = engine.start(delivery_config()).await.unwrap();

    // No token yet, and the query does not block waiting for one
    assert_eq!(engine.get_push_token(id), None);

    let handle = host.handle_for_type("delivery").unwrap();
    host.issue_push_token(&handle, "80f0a1b2");

    assert_eq!(engine.get_push_token(id), Some("80f0a1b2".to_string()));

    // Immediate end removes the token along with the entry
    engine
        .end(id, None, DismissalPolicy::Immediate)
        .await
        .unwrap();
    assert_eq!(engine.get_push_token(id), None);
}

#[tokio::test]
async fn test_unsupported_host_fails_without_registry_mutation() {
    init_test_tracing();
    let engine = LiveActivityEngine::unsupported();

    assert!(!engine.are_activities_enabled());

    let result = engine.start(delivery_config()).await;
    assert_eq!(result, Err(ActivityError::Unsupported));
    assert!(engine.list_active().is_empty());

    // end_all on an empty registry succeeds vacuously
    let report = engine.end_all().await;
    assert!(report.is_all_ok());
    assert!(report.outcomes.is_empty());
}

#[tokio::test]
async fn test_rank_for_display_orders_by_relevance() {
    let (_host, engine) = engine_with_host();

    let low = engine
        .start(
            StartConfig::new("low", serde_json::json!({}), serde_json::json!({}))
                .with_relevance_score(5.0),
        )
        .await
        .unwrap();
    let high = engine
        .start(
            StartConfig::new("high", serde_json::json!({}), serde_json::json!({}))
                .with_relevance_score(95.0),
        )
        .await
        .unwrap();
    let unscored = engine
        .start(StartConfig::new(
            "unscored",
            serde_json::json!({}),
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    let ranked: Vec<_> = engine.rank_for_display(3).iter().map(|a| a.id()).collect();
    assert_eq!(ranked, vec![high, low, unscored]);

    // Slot limit trims the tail
    let ranked: Vec<_> = engine.rank_for_display(1).iter().map(|a| a.id()).collect();
    assert_eq!(ranked, vec![high]);
}

#[tokio::test]
async fn test_typed_template_flow() {
    let (host, engine) = engine_with_host();

    let attributes = DeliveryAttributes {
        courier_name: "Kim".to_string(),
        order_number: "42".to_string(),
        order_items: None,
        delivery_address: None,
    };
    let state = DeliveryState::new(DeliveryStatus::Preparing, Utc::now());

    let id = engine
        .start_template::<DeliveryTracking>(&attributes, &state)
        .await
        .unwrap();

    let active = engine.list_active();
    assert_eq!(active[0].activity_type(), "delivery-tracking-v1");
    assert_eq!(active[0].attributes()["courierName"], "Kim");

    let nearby = DeliveryState::new(DeliveryStatus::Nearby, Utc::now()).with_stops_remaining(1);
    engine
        .update_template::<DeliveryTracking>(id, &nearby)
        .await
        .unwrap();

    assert_eq!(engine.list_active()[0].content_state()["status"], "nearby");

    engine
        .end(
            id,
            Some(DeliveryTracking::final_content(true)),
            DismissalPolicy::Immediate,
        )
        .await
        .unwrap();
    assert!(engine.list_active().is_empty());
    assert_eq!(host.surface_count(), 0);
}
