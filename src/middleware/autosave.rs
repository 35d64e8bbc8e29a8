use tracing::info;

use super::Middleware;
use crate::model::OperationType;
use crate::store::selectors::dirty_bcs;
use crate::store::{Action, AppState, Store};

/// Saves pending edits before an action that would abandon them.
///
/// Every dirty BC other than the base one is saved right away; the
/// triggering action is re-dispatched only after the base BC's save
/// succeeds.
pub struct AutosaveMiddleware;

impl AutosaveMiddleware {
    /// BC of the triggering action, `Some(None)` for triggers without one,
    /// `None` when the action does not abandon an edit.
    fn trigger(state: &AppState, action: &Action, dirty: &[String]) -> Option<Option<String>> {
        match action {
            Action::SendOperation {
                bc_name,
                operation_type: operation_type @ OperationType::Custom(_),
                widget_name,
                ..
            } => {
                let default_save = widget_name
                    .as_deref()
                    .and_then(|name| state.view.widget(name))
                    .and_then(|widget| widget.options.default_save.as_ref())
                    == Some(operation_type);
                let others = dirty.iter().any(|bc| bc != bc_name);
                (!default_save && others).then(|| Some(bc_name.clone()))
            }
            Action::SelectTableCellInit {
                widget_name,
                row_id,
                ..
            } => {
                let moved = state.view.selected_cell.as_ref().is_some_and(|cell| {
                    &cell.widget_name != widget_name || &cell.row_id != row_id
                });
                let bc_name = state
                    .view
                    .widget(widget_name)
                    .map(|widget| widget.bc_name.clone());
                moved.then_some(bc_name)
            }
            Action::BcSelectRecord { bc_name, cursor } => {
                let changed = state.screen.cursor(bc_name) != Some(cursor.as_str());
                (changed && dirty.contains(bc_name)).then(|| Some(bc_name.clone()))
            }
            Action::ChangeLocation { .. } => Some(None),
            _ => None,
        }
    }

    fn save_action(state: &AppState, bc_name: &str, on_success: Option<Action>) -> Action {
        let widget = state.view.widget_of(bc_name);
        let operation_type = widget
            .and_then(|widget| widget.options.default_save.clone())
            .unwrap_or(OperationType::Save);
        Action::SendOperation {
            bc_name: bc_name.to_string(),
            operation_type,
            widget_name: widget.map(|widget| widget.name.clone()),
            on_success_action: on_success.map(Box::new),
            confirm: None,
        }
    }
}

impl Middleware for AutosaveMiddleware {
    fn name(&self) -> &'static str {
        "autosave"
    }

    fn handle(&self, store: &Store, action: Action) -> Option<Action> {
        let state = store.state();
        let dirty = dirty_bcs(&state);
        if dirty.is_empty() {
            return Some(action);
        }
        let Some(own) = Self::trigger(&state, &action, &dirty) else {
            return Some(action);
        };
        let base = match own {
            Some(bc_name) if dirty.contains(&bc_name) => bc_name,
            _ => dirty[0].clone(),
        };
        info!(
            action = action.kind(),
            base = %base,
            dirty = dirty.len(),
            "Saving pending changes before continuing"
        );
        for bc_name in dirty.iter().filter(|bc| **bc != base) {
            store.dispatch(Self::save_action(&state, bc_name, None));
        }
        Some(Self::save_action(&state, &base, Some(action)))
    }
}
