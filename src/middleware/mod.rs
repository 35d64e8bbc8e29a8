//! Interceptors run on every dispatched action before it reaches the reducers.
//!
//! A middleware may pass the action through (possibly rewritten), dispatch
//! other actions first, or consume it by returning `None`.

mod autosave;
mod navigation;
mod pre_invoke;
mod required_fields;

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::store::{Action, Store};

pub use autosave::AutosaveMiddleware;
pub use navigation::NavigationCancelMiddleware;
pub use pre_invoke::PreInvokeMiddleware;
pub use required_fields::RequiredFieldsMiddleware;

pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    fn handle(&self, store: &Store, action: Action) -> Option<Action>;
}

/// The standard chain, in execution order.
pub fn default_chain(settings: &EngineConfig) -> Vec<Arc<dyn Middleware>> {
    let mut chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(NavigationCancelMiddleware)];
    if settings.autosave {
        chain.push(Arc::new(AutosaveMiddleware));
    }
    chain.push(Arc::new(RequiredFieldsMiddleware));
    chain.push(Arc::new(PreInvokeMiddleware));
    chain
}
