use tracing::debug;

use super::Middleware;
use crate::store::{Action, Store};

/// Cancels every outstanding fetch when the user leaves the view.
pub struct NavigationCancelMiddleware;

impl Middleware for NavigationCancelMiddleware {
    fn name(&self) -> &'static str {
        "navigation_cancel"
    }

    fn handle(&self, store: &Store, action: Action) -> Option<Action> {
        if matches!(action, Action::SelectView { .. } | Action::SelectScreen { .. }) {
            let cancelled = store.cancel_registry().cancel_fetches();
            if cancelled > 0 {
                debug!(cancelled, action = action.kind(), "Cancelled in-flight fetches");
            }
        }
        Some(action)
    }
}
