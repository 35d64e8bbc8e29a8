//! Save round trip against the mock backend.

mod common;

use bcflow::model::{MessageType, OperationType};
use bcflow::store::{Action, Route, ViewErrorKind};
use common::mock_backend::{MockBackend, MockResponse};
use common::{harness, open_view, Harness};
use serde_json::json;

async fn customer_card(backend: &MockBackend) -> Harness {
    backend
        .respond(
            "GET",
            "/data/app/customer",
            MockResponse::json(json!({"data": [{"id": "7", "vstamp": 2, "name": "Ann"}]})),
        )
        .await;
    backend
        .always(
            "GET",
            "/row-meta/app/customer/7",
            MockResponse::json(json!({"row": {"fields": [
                {"key": "name", "currentValue": "Ann", "disabled": true},
                {"key": "city", "currentValue": null}
            ]}})),
        )
        .await;
    let h = harness(backend);
    open_view(&h, "card").await;
    h
}

#[tokio::test]
async fn test_disabled_fields_are_stripped_and_vstamp_echoed() {
    let backend = MockBackend::start().await;
    let h = customer_card(&backend).await;

    h.dispatch(Action::change_data_item("customer", "7", "name", json!("Bob")));
    h.dispatch(Action::send_operation(
        "customer",
        OperationType::Save,
        Some("customerForm".into()),
    ));
    h.settle().await;

    let puts = backend.requests_to("PUT", "/data/app/customer/7").await;
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].body, Some(json!({"data": {"vstamp": 2}})));
}

#[tokio::test]
async fn test_successful_save_replaces_record_and_clears_delta() {
    let backend = MockBackend::start().await;
    let h = customer_card(&backend).await;
    backend
        .respond(
            "PUT",
            "/data/app/customer/7",
            MockResponse::json(json!({"record": {"id": "7", "vstamp": 3, "name": "Ann", "city": "Oslo"}})),
        )
        .await;

    h.dispatch(Action::change_data_item("customer", "7", "city", json!("Oslo")));
    h.dispatch(Action::send_operation("customer", OperationType::Save, None));
    h.settle().await;

    let puts = backend.requests_to("PUT", "/data/app/customer/7").await;
    assert_eq!(puts[0].body, Some(json!({"data": {"city": "Oslo", "vstamp": 2}})));

    let state = h.engine.state();
    let record = state.data.record("customer", "7").unwrap();
    assert_eq!(record.vstamp, 3);
    assert_eq!(record.get("city"), Some(&json!("Oslo")));
    assert!(state.view.delta("customer", "7").is_none());
    assert!(!state.view.saving.contains("customer"));
    // Row meta and children are reloaded for the saved record.
    assert_eq!(
        backend.requests_to("GET", "/row-meta/app/customer/7").await.len(),
        2
    );
}

#[tokio::test]
async fn test_business_rejection_attaches_field_errors() {
    let backend = MockBackend::start().await;
    let h = customer_card(&backend).await;
    backend
        .respond(
            "PUT",
            "/data/app/customer/7",
            MockResponse::error(
                400,
                json!({"success": false, "error": {
                    "entity": {"bcName": "customer", "fields": {"city": "Unknown city"}},
                    "popup": ["Check the address"]
                }}),
            ),
        )
        .await;

    h.dispatch(Action::change_data_item("customer", "7", "city", json!("Atlantis")));
    h.dispatch(Action::send_operation("customer", OperationType::Save, None));
    h.settle().await;

    let state = h.engine.state();
    assert_eq!(
        state.view.field_errors["customer"]["7"].get("city").map(String::as_str),
        Some("Unknown city")
    );
    assert_eq!(
        state.view.delta("customer", "7").and_then(|delta| delta.get("city")),
        Some(&json!("Atlantis"))
    );
    let error = state.view.error.as_ref().unwrap();
    assert_eq!(error.kind, ViewErrorKind::Business);
    assert_eq!(error.message, "Check the address");
    // No follow-up was attached, so no discard prompt either.
    assert!(state.session.notifications.is_empty());
}

#[tokio::test]
async fn test_failed_save_before_navigation_offers_discard() {
    let backend = MockBackend::start().await;
    let h = customer_card(&backend).await;
    backend
        .respond(
            "PUT",
            "/data/app/customer/7",
            MockResponse::error(500, json!({"message": "boom"})),
        )
        .await;

    h.dispatch(Action::change_data_item("customer", "7", "city", json!("Oslo")));
    h.dispatch(Action::SendOperation {
        bc_name: "customer".into(),
        operation_type: OperationType::Save,
        widget_name: Some("customerForm".into()),
        on_success_action: Some(Box::new(Action::ChangeLocation {
            route: Route::new("app", Some("card"), "customer/8"),
        })),
        confirm: None,
    });
    h.settle().await;

    let state = h.engine.state();
    let notification = state.session.notifications.last().unwrap();
    assert_eq!(notification.kind, MessageType::Error);
    assert_eq!(
        notification.action.as_deref(),
        Some(&Action::BcCancelPendingChanges {
            bc_names: Some(vec!["customer".to_string()])
        })
    );
    assert_eq!(notification.action_label.as_deref(), Some("Cancel changes"));
    // The navigation never happened.
    assert!(state.router.route.is_none());
    assert!(!state.view.saving.contains("customer"));
}

#[tokio::test]
async fn test_required_field_blocks_save() {
    let backend = MockBackend::start().await;
    backend
        .respond(
            "GET",
            "/data/app/customer",
            MockResponse::json(json!({"data": [{"id": "7", "vstamp": 2}]})),
        )
        .await;
    backend
        .always(
            "GET",
            "/row-meta/app/customer/7",
            MockResponse::json(json!({"row": {"fields": [
                {"key": "name", "required": true}
            ]}})),
        )
        .await;
    let h = harness(&backend);
    open_view(&h, "card").await;

    h.dispatch(Action::send_operation("customer", OperationType::Save, None));
    h.settle().await;

    assert!(backend.requests_to("PUT", "/data/app/customer/7").await.is_empty());
    let state = h.engine.state();
    assert_eq!(
        state.view.pending_validation_fails["customer"]["7"]
            .get("name")
            .map(String::as_str),
        Some("This field is mandatory")
    );
}

#[tokio::test]
async fn test_expired_session_logs_out() {
    let backend = MockBackend::start().await;
    let h = customer_card(&backend).await;
    backend
        .respond("PUT", "/data/app/customer/7", MockResponse::error(401, json!({})))
        .await;

    h.dispatch(Action::send_operation("customer", OperationType::Save, None));
    h.settle().await;

    let state = h.engine.state();
    assert!(!state.session.active);
    assert!(state.screen.bo.is_empty());
    assert_eq!(h.navigator.pushed.lock().last().map(String::as_str), Some("/"));
}

#[tokio::test]
async fn test_server_redirect_navigates_and_abandons_save() {
    let backend = MockBackend::start().await;
    let h = customer_card(&backend).await;
    backend
        .respond("PUT", "/data/app/customer/7", MockResponse::redirect("/login"))
        .await;

    h.dispatch(Action::change_data_item("customer", "7", "city", json!("Oslo")));
    h.dispatch(Action::SendOperation {
        bc_name: "customer".into(),
        operation_type: OperationType::Save,
        widget_name: Some("customerForm".into()),
        on_success_action: Some(Box::new(Action::ChangeLocation {
            route: Route::new("app", Some("regions"), ""),
        })),
        confirm: None,
    });
    h.settle().await;

    assert_eq!(h.navigator.pushed.lock().clone(), vec!["/login".to_string()]);
    let state = h.engine.state();
    assert!(state.view.delta("customer", "7").is_some());
    assert!(state.view.error.is_none());
    assert!(!h
        .actions()
        .iter()
        .any(|action| matches!(action, Action::ChangeLocation { .. })));
    assert!(h
        .actions()
        .iter()
        .any(|action| matches!(action, Action::BcSaveDataFail { .. })));
}
