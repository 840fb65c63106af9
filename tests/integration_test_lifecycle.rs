mod common;

use common::{sample_payload, TestApp};
use shipment_backend::domain::models::shipment::ShipmentStatus;
use shipment_backend::error::AppError;

#[tokio::test]
async fn creation_writes_exactly_one_received_entry() {
    let app = TestApp::new().await;
    let operator = app.seed_operator("acme").await;

    let shipment = app
        .state
        .ledger
        .create(
            &operator,
            sample_payload("ada@example.com", "bob@example.com"),
        )
        .await
        .unwrap();

    assert_eq!(shipment.current_status, ShipmentStatus::Received);
    assert_eq!(shipment.version, 1);

    let history = app
        .state
        .ledger
        .history(&operator, &shipment.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, ShipmentStatus::Received);
    assert_eq!(history[0].seq, 1);
    assert_eq!(history[0].actor_id, operator.user_id);
}

#[tokio::test]
async fn status_always_matches_latest_history_entry() {
    let app = TestApp::new().await;
    let operator = app.seed_operator("acme").await;

    let shipment = app
        .state
        .ledger
        .create(
            &operator,
            sample_payload("ada@example.com", "bob@example.com"),
        )
        .await
        .unwrap();

    for status in [
        ShipmentStatus::InTransit,
        ShipmentStatus::OutForDelivery,
        ShipmentStatus::Delivered,
    ] {
        app.state
            .ledger
            .transition(&operator, &shipment.id, status, None)
            .await
            .unwrap();

        let current = app.state.ledger.get(&operator, &shipment.id).await.unwrap();
        let history = app
            .state
            .ledger
            .history(&operator, &shipment.id)
            .await
            .unwrap();
        let latest = history.last().unwrap();

        assert_eq!(current.current_status, status);
        assert_eq!(latest.status, current.current_status);
        assert_eq!(latest.seq, current.version);
    }
}

#[tokio::test]
async fn skipping_forward_is_rejected() {
    let app = TestApp::new().await;
    let operator = app.seed_operator("acme").await;

    let shipment = app
        .state
        .ledger
        .create(
            &operator,
            sample_payload("ada@example.com", "bob@example.com"),
        )
        .await
        .unwrap();

    for status in [ShipmentStatus::OutForDelivery, ShipmentStatus::Delivered] {
        let err = app
            .state
            .ledger
            .transition(&operator, &shipment.id, status, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IllegalTransition { .. }));
    }

    // The failed attempts left no trace.
    let history = app
        .state
        .ledger
        .history(&operator, &shipment.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);

    // The legal successor still works.
    app.state
        .ledger
        .transition(&operator, &shipment.id, ShipmentStatus::InTransit, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn moving_backward_is_rejected() {
    let app = TestApp::new().await;
    let operator = app.seed_operator("acme").await;

    let shipment = app
        .state
        .ledger
        .create(
            &operator,
            sample_payload("ada@example.com", "bob@example.com"),
        )
        .await
        .unwrap();

    app.state
        .ledger
        .transition(&operator, &shipment.id, ShipmentStatus::InTransit, None)
        .await
        .unwrap();

    let err = app
        .state
        .ledger
        .transition(&operator, &shipment.id, ShipmentStatus::Received, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::IllegalTransition { .. }));
}

#[tokio::test]
async fn returned_is_reachable_and_terminal() {
    let app = TestApp::new().await;
    let operator = app.seed_operator("acme").await;

    let shipment = app
        .state
        .ledger
        .create(
            &operator,
            sample_payload("ada@example.com", "bob@example.com"),
        )
        .await
        .unwrap();

    app.state
        .ledger
        .transition(&operator, &shipment.id, ShipmentStatus::InTransit, None)
        .await
        .unwrap();
    let entry = app
        .state
        .ledger
        .transition(
            &operator,
            &shipment.id,
            ShipmentStatus::Returned,
            Some("Recipient refused the parcel".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(entry.comment.as_deref(), Some("Recipient refused the parcel"));

    for status in [
        ShipmentStatus::Received,
        ShipmentStatus::InTransit,
        ShipmentStatus::OutForDelivery,
        ShipmentStatus::Delivered,
    ] {
        let err = app
            .state
            .ledger
            .transition(&operator, &shipment.id, status, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IllegalTransition { .. }));
    }
}

#[tokio::test]
async fn delivered_is_terminal() {
    let app = TestApp::new().await;
    let operator = app.seed_operator("acme").await;

    let shipment = app
        .state
        .ledger
        .create(
            &operator,
            sample_payload("ada@example.com", "bob@example.com"),
        )
        .await
        .unwrap();

    for status in [
        ShipmentStatus::InTransit,
        ShipmentStatus::OutForDelivery,
        ShipmentStatus::Delivered,
    ] {
        app.state
            .ledger
            .transition(&operator, &shipment.id, status, None)
            .await
            .unwrap();
    }

    let err = app
        .state
        .ledger
        .transition(&operator, &shipment.id, ShipmentStatus::Returned, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::IllegalTransition { .. }));
}

#[tokio::test]
async fn invalid_payloads_are_rejected() {
    let app = TestApp::new().await;
    let operator = app.seed_operator("acme").await;

    let mut payload = sample_payload("ada@example.com", "bob@example.com");
    payload.weight_kg = 0.0;
    let err = app.state.ledger.create(&operator, payload).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut payload = sample_payload("ada@example.com", "bob@example.com");
    payload.declared_value = -5.0;
    let err = app.state.ledger.create(&operator, payload).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn public_tracking_exposes_progress_without_auth() {
    let app = TestApp::new().await;
    let operator = app.seed_operator("acme").await;

    let shipment = app
        .state
        .ledger
        .create(
            &operator,
            sample_payload("ada@example.com", "bob@example.com"),
        )
        .await
        .unwrap();
    app.state
        .ledger
        .transition(&operator, &shipment.id, ShipmentStatus::InTransit, None)
        .await
        .unwrap();

    let view = app
        .state
        .ledger
        .track(&shipment.tracking_code)
        .await
        .unwrap();
    assert_eq!(view.tracking_code, shipment.tracking_code);
    assert_eq!(view.current_status, ShipmentStatus::InTransit);
    assert_eq!(view.events.len(), 2);
    assert_eq!(view.events[0].status, ShipmentStatus::Received);
    assert_eq!(view.events[1].status, ShipmentStatus::InTransit);

    let err = app.state.ledger.track("TRK-DOESNOTEXIST").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn shipments_are_invisible_across_tenants() {
    let app = TestApp::new().await;
    let acme_op = app.seed_operator("acme").await;
    let rival_op = app.seed_operator("rival").await;

    let shipment = app
        .state
        .ledger
        .create(
            &acme_op,
            sample_payload("ada@example.com", "bob@example.com"),
        )
        .await
        .unwrap();

    // Same id, wrong tenant: indistinguishable from non-existence.
    let err = app.state.ledger.get(&rival_op, &shipment.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = app
        .state
        .ledger
        .transition(&rival_op, &shipment.id, ShipmentStatus::InTransit, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    assert!(app.state.ledger.list(&rival_op).await.unwrap().is_empty());
}

#[tokio::test]
async fn tracking_codes_are_globally_unique_across_tenants() {
    let app = TestApp::new().await;
    let acme_op = app.seed_operator("acme").await;
    let rival_op = app.seed_operator("rival").await;

    let a = app
        .state
        .ledger
        .create(
            &acme_op,
            sample_payload("ada@example.com", "bob@example.com"),
        )
        .await
        .unwrap();
    let b = app
        .state
        .ledger
        .create(
            &rival_op,
            sample_payload("carol@example.com", "dave@example.com"),
        )
        .await
        .unwrap();

    assert_ne!(a.tracking_code, b.tracking_code);

    // Public lookup resolves regardless of tenant.
    assert!(app.state.ledger.track(&a.tracking_code).await.is_ok());
    assert!(app.state.ledger.track(&b.tracking_code).await.is_ok());
}
