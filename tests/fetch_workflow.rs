//! BC loading: request shape, follow-up ordering, hierarchy depth and cancellation.

mod common;

use bcflow::config::Config;
use bcflow::store::{Action, FetchRequest, Store, ViewErrorKind};
use common::mock_backend::{MockBackend, MockResponse};
use common::{config_for, harness, harness_with, kinds, open_view};
use serde_json::json;
use std::time::Duration;

fn one_customer() -> MockResponse {
    MockResponse::json(json!({"data": [{"id": "7", "vstamp": 2}], "hasNext": false}))
}

#[tokio::test]
async fn test_root_fetch_selects_first_record_and_loads_row_meta() {
    let backend = MockBackend::start().await;
    backend.respond("GET", "/data/app/customer", one_customer()).await;
    let h = harness(&backend);

    open_view(&h, "card").await;

    let requests = backend.requests_to("GET", "/data/app/customer").await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query_value("_page"), Some("1"));
    assert_eq!(requests[0].query_value("_limit"), Some("30"));

    let state = h.engine.state();
    assert_eq!(state.screen.cursor("customer"), Some("7"));
    assert!(!state.screen.bc("customer").unwrap().loading);
    assert_eq!(state.data.records("customer").len(), 1);
    assert_eq!(
        backend.requests_to("GET", "/row-meta/app/customer/7").await.len(),
        1
    );
    assert_eq!(
        backend
            .requests_to("GET", "/data/app/customer/7/contact")
            .await
            .len(),
        1
    );
}

#[tokio::test]
async fn test_success_followups_are_ordered() {
    let backend = MockBackend::start().await;
    backend.respond("GET", "/data/app/customer", one_customer()).await;
    let h = harness(&backend);

    open_view(&h, "card").await;

    let actions = h.actions();
    let start = actions
        .iter()
        .position(|action| {
            matches!(action, Action::BcChangeCursors { cursors, .. } if cursors.contains_key("customer"))
        })
        .expect("customer cursor change");
    let window = &actions[start..start + 5];
    assert_eq!(
        kinds(window),
        vec![
            "bcChangeCursors",
            "bcFetchDataSuccess",
            "bcFetchRowMeta",
            "bcFetchDataRequest",
            "bcFetchDataRequest",
        ]
    );
    // One request per child BC, even with two widgets on `contact`.
    let children: Vec<&str> = window[3..]
        .iter()
        .filter_map(|action| action.bc_name())
        .collect();
    assert_eq!(children, vec!["contact", "note"]);
}

#[tokio::test]
async fn test_empty_result_clears_cursor_without_cascade() {
    let backend = MockBackend::start().await;
    backend
        .respond("GET", "/data/app/customer", MockResponse::json(json!({"data": []})))
        .await;
    let h = harness(&backend);

    open_view(&h, "card").await;

    assert_eq!(h.engine.state().screen.cursor("customer"), None);
    let requests = backend.captured_requests().await;
    assert_eq!(requests.len(), 1);
    assert!(!kinds(&h.actions()).contains(&"bcFetchRowMeta"));
}

#[tokio::test]
async fn test_failed_fetch_clears_loading_and_reports_error() {
    let backend = MockBackend::start().await;
    backend
        .respond(
            "GET",
            "/data/app/customer",
            MockResponse::error(500, json!({"message": "boom"})),
        )
        .await;
    let h = harness(&backend);

    open_view(&h, "card").await;

    let state = h.engine.state();
    assert!(!state.screen.bc("customer").unwrap().loading);
    assert!(state.view.error.is_some());
    assert!(kinds(&h.actions()).contains(&"bcFetchDataFail"));
}

#[tokio::test]
async fn test_unreachable_backend_reports_network_error() {
    // Bind and release a port so nothing listens on it.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let mut config = Config::default();
    config.api.base_url = format!("http://{}/api/v1", addr);
    config.api.connect_timeout_seconds = 2;
    let h = harness_with(config);

    open_view(&h, "card").await;

    let state = h.engine.state();
    assert!(!state.screen.bc("customer").unwrap().loading);
    assert_eq!(
        state.view.error.as_ref().map(|error| error.kind),
        Some(ViewErrorKind::Network)
    );
    assert!(kinds(&h.actions()).contains(&"bcFetchDataFail"));
}

#[tokio::test]
async fn test_same_bc_hierarchy_stops_at_max_depth() {
    let backend = MockBackend::start().await;
    backend
        .always(
            "GET",
            "/data/app/region",
            MockResponse::json(json!({"data": [{"id": "r1"}], "hasNext": true})),
        )
        .await;
    let h = harness(&backend);

    open_view(&h, "regions").await;

    let requests = backend.requests_to("GET", "/data/app/region").await;
    assert_eq!(requests.len(), 10);
    assert_eq!(requests[0].query_value("parentId.specified"), Some("false"));
    assert!(requests[1..]
        .iter()
        .all(|req| req.query_value("parentId.equals") == Some("r1")));

    let deepest = h
        .actions()
        .iter()
        .filter_map(|action| match action {
            Action::BcFetchDataRequest(request) => request.depth,
            _ => None,
        })
        .max();
    assert_eq!(deepest, Some(10));

    let region = h.engine.state().screen.bc("region").unwrap().clone();
    assert!(region.depth_bc.values().all(|level| !level.loading));
    assert_eq!(region.cursor_at(Some(10)), Some("r1"));
}

#[tokio::test]
async fn test_configured_depth_limit_is_respected() {
    let backend = MockBackend::start().await;
    backend
        .always(
            "GET",
            "/data/app/region",
            MockResponse::json(json!({"data": [{"id": "r1"}]})),
        )
        .await;
    let mut config: Config = config_for(&backend);
    config.engine.hierarchy_max_depth = 3;
    let h = harness_with(config);

    open_view(&h, "regions").await;

    assert_eq!(backend.requests_to("GET", "/data/app/region").await.len(), 3);
}

#[tokio::test]
async fn test_view_switch_cancels_outstanding_fetch() {
    let backend = MockBackend::start().await;
    backend
        .respond("GET", "/data/app/customer", one_customer().with_delay(300))
        .await;
    let h = harness(&backend);

    h.engine.select_screen(common::customer_screen());
    assert!(h.engine.select_view("card"));
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(h.engine.select_view("regions"));
    h.settle().await;

    let state = h.engine.state();
    assert!(state.data.records("customer").is_empty());
    assert!(!state.screen.bc("customer").unwrap().loading);
    assert!(!h.actions().iter().any(|action| matches!(
        action,
        Action::BcFetchDataSuccess { bc_name, .. } if bc_name == "customer"
    )));
    assert_eq!(h.engine.store().cancel_registry().in_flight(), 0);

    // The abandoned fetch reports nothing into the newer view.
    let actions = h.actions();
    let switched = actions
        .iter()
        .rposition(|action| matches!(action, Action::SelectView { .. }))
        .unwrap();
    assert!(!actions[switched..].iter().any(|action| matches!(
        action,
        Action::BcFetchDataFail { bc_name, .. } if bc_name == "customer"
    )));
}

#[tokio::test]
async fn test_load_more_appends_next_page() {
    let backend = MockBackend::start().await;
    backend.respond("GET", "/data/app/customer", one_customer()).await;
    backend
        .respond(
            "GET",
            "/data/app/customer",
            MockResponse::json(json!({"data": [{"id": "8", "vstamp": 1}]})),
        )
        .await;
    let h = harness(&backend);
    open_view(&h, "card").await;

    h.dispatch(Action::BcLoadMore {
        bc_name: "customer".into(),
        widget_name: Some("customerForm".into()),
    });
    h.settle().await;

    let requests = backend.requests_to("GET", "/data/app/customer").await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].query_value("_page"), Some("2"));
    let state = h.engine.state();
    let ids: Vec<&str> = state
        .data
        .records("customer")
        .iter()
        .map(|record| record.id.as_str())
        .collect();
    assert_eq!(ids, vec!["7", "8"]);
    assert_eq!(state.screen.cursor("customer"), Some("7"));
}

#[tokio::test]
async fn test_explicit_page_range_widens_limit() {
    let backend = MockBackend::start().await;
    let h = harness(&backend);
    open_view(&h, "card").await;
    backend.clear().await;

    h.dispatch(Action::BcFetchDataRequest(
        FetchRequest::new("customer").pages(1, 3),
    ));
    h.settle().await;

    let requests = backend.requests_to("GET", "/data/app/customer").await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query_value("_limit"), Some("90"));
}

#[tokio::test]
async fn test_action_log_replays_to_the_same_state() {
    let backend = MockBackend::start().await;
    backend.respond("GET", "/data/app/customer", one_customer()).await;
    let h = harness(&backend);
    let mut events = h.engine.store().subscribe();

    open_view(&h, "card").await;

    let actions = h.actions();
    let mut streamed = Vec::new();
    while let Ok(action) = events.try_recv() {
        streamed.push(action);
    }
    assert_eq!(streamed, actions);
    assert_eq!(Store::replay(&actions), *h.engine.state());
}
