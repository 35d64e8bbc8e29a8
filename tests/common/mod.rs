//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_backend;

use bcflow::config::{ApiConfig, Config};
use bcflow::host::{Navigator, Notifier};
use bcflow::model::{MessageType, ScreenMeta};
use bcflow::store::Action;
use bcflow::Engine;
use parking_lot::Mutex;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use mock_backend::MockBackend;

/// Navigator that records every call.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    pub pushed: Mutex<Vec<String>>,
    pub external: Mutex<Vec<(String, bool)>>,
    pub downloads: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn push(&self, url: &str) {
        self.pushed.lock().push(url.to_string());
    }

    fn open_external(&self, url: &str, new_tab: bool) {
        self.external.lock().push((url.to_string(), new_tab));
    }

    fn download(&self, url: &str) {
        self.downloads.lock().push(url.to_string());
    }
}

/// Notifier that records every toast.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub shown: Mutex<Vec<(MessageType, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: MessageType, message: &str) {
        self.shown.lock().push((kind, message.to_string()));
    }
}

/// Engine plus the recording collaborators it was built with.
pub struct Harness {
    pub engine: Engine,
    pub navigator: Arc<RecordingNavigator>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn dispatch(&self, action: Action) {
        self.engine.dispatch(action);
    }

    /// Waits for every workflow to settle, failing the test after five seconds.
    pub async fn settle(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.engine.wait_idle())
            .await
            .expect("workflows did not settle");
    }

    /// Actions committed so far.
    pub fn actions(&self) -> Vec<Action> {
        self.engine.store().actions()
    }

    /// Committed actions starting at index `from`.
    pub fn actions_since(&self, from: usize) -> Vec<Action> {
        self.actions().into_iter().skip(from).collect()
    }
}

pub fn config_for(backend: &MockBackend) -> Config {
    Config {
        api: ApiConfig {
            base_url: backend.base_url(),
            timeout_seconds: 5,
            connect_timeout_seconds: 2,
        },
        ..Config::default()
    }
}

pub fn harness(backend: &MockBackend) -> Harness {
    harness_with(config_for(backend))
}

pub fn harness_with(config: Config) -> Harness {
    let navigator = Arc::new(RecordingNavigator::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = Engine::builder(config)
        .navigator(navigator.clone())
        .notifier(notifier.clone())
        .build()
        .expect("engine builds");
    Harness {
        engine,
        navigator,
        notifier,
    }
}

/// `customer -> contact` screen with a list/form view, a same-BC region tree
/// and an association popup.
pub fn customer_screen() -> ScreenMeta {
    serde_json::from_value(json!({
        "name": "app",
        "bo": {"bc": [
            {"name": "customer", "url": "customer/:id"},
            {"name": "contact", "parentName": "customer", "url": "customer/:id/contact/:id"},
            {"name": "note", "parentName": "customer", "url": "customer/:id/note/:id"},
            {"name": "tagAssoc", "url": "tagAssoc/:id"},
            {"name": "region", "url": "region/:id"}
        ]},
        "views": [
            {"name": "card", "url": "/screen/app/view/card", "widgets": [
                {"name": "customerForm", "type": "Form", "bcName": "customer",
                 "fields": [{"key": "tags", "type": "multivalue", "popupBcName": "tagAssoc", "assocValueKey": "title"}]},
                {"name": "contactList", "type": "List", "bcName": "contact"},
                {"name": "contactForm", "type": "Form", "bcName": "contact"},
                {"name": "noteList", "type": "List", "bcName": "note",
                 "options": {"defaultSave": "submit"}},
                {"name": "tagPopup", "type": "AssocListPopup", "bcName": "tagAssoc"}
            ]},
            {"name": "regions", "url": "/screen/app/view/regions", "widgets": [
                {"name": "regionTree", "type": "List", "bcName": "region",
                 "options": {"hierarchySameBc": true}}
            ]}
        ],
        "primary": "card"
    }))
    .expect("valid screen")
}

/// Opens `view` of the customer screen and waits for the initial loads.
pub async fn open_view(harness: &Harness, view: &str) {
    harness.engine.select_screen(customer_screen());
    assert!(harness.engine.select_view(view));
    harness.settle().await;
}

pub fn kinds(actions: &[Action]) -> Vec<&'static str> {
    actions.iter().map(Action::kind).collect()
}

/// Create a temporary config file with the given TOML body.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}
