//! Engine facade: wires configuration, the backend client, host
//! collaborators, middleware and workflows into one [`Store`].

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::api::{Api, ApiError, HttpApi};
use crate::config::{Config, ConfigError};
use crate::host::{
    IdentityTranslator, Navigator, Notifier, TracingNavigator, TracingNotifier, Translator,
};
use crate::middleware::default_chain;
use crate::model::ScreenMeta;
use crate::store::{Action, AppState, Services, Store};
use crate::workflows::default_workflows;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create backend client: {0}")]
    Api(#[from] ApiError),
}

pub struct EngineBuilder {
    config: Config,
    api: Option<Arc<dyn Api>>,
    navigator: Option<Arc<dyn Navigator>>,
    notifier: Option<Arc<dyn Notifier>>,
    translator: Option<Arc<dyn Translator>>,
}

impl EngineBuilder {
    /// Replaces the reqwest backend client.
    pub fn api(mut self, api: Arc<dyn Api>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn build(self) -> Result<Engine, EngineError> {
        self.config.validate()?;
        let api: Arc<dyn Api> = match self.api {
            Some(api) => api,
            None => Arc::new(HttpApi::new(&self.config.api)?),
        };
        let settings = self.config.engine.clone();
        let middleware = default_chain(&settings);
        let workflows = default_workflows();
        info!(
            base_url = %self.config.api.base_url,
            middleware = middleware.len(),
            workflows = workflows.len(),
            autosave = settings.autosave,
            "Engine ready"
        );
        let services = Services {
            api,
            navigator: self
                .navigator
                .unwrap_or_else(|| Arc::new(TracingNavigator)),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
            translator: self
                .translator
                .unwrap_or_else(|| Arc::new(IdentityTranslator)),
            settings,
        };
        Ok(Engine {
            store: Store::new(services, middleware, workflows),
        })
    }
}

/// Handle to a running engine. Clones share the same store.
#[derive(Clone)]
pub struct Engine {
    store: Store,
}

impl Engine {
    pub fn builder(config: Config) -> EngineBuilder {
        EngineBuilder {
            config,
            api: None,
            navigator: None,
            notifier: None,
            translator: None,
        }
    }

    pub fn dispatch(&self, action: Action) {
        self.store.dispatch(action);
    }

    pub fn state(&self) -> Arc<AppState> {
        self.store.state()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Resolves once every workflow started so far has finished.
    pub async fn wait_idle(&self) {
        self.store.wait_idle().await;
    }

    pub fn select_screen(&self, screen: ScreenMeta) {
        self.dispatch(Action::SelectScreen { screen });
    }

    /// Selects a view of the current screen; `false` when it has no such view.
    pub fn select_view(&self, name: &str) -> bool {
        let Some(view) = self.state().screen.view(name).cloned() else {
            return false;
        };
        self.dispatch(Action::SelectView { view });
        true
    }
}
