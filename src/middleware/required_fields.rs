use tracing::warn;

use super::Middleware;
use crate::model::{is_empty_value, OperationType};
use crate::store::selectors::{build_bc_url, effective_record};
use crate::store::{Action, FieldErrors, Store};

/// Blocks saves while a required field of the record is empty.
pub struct RequiredFieldsMiddleware;

impl Middleware for RequiredFieldsMiddleware {
    fn name(&self) -> &'static str {
        "required_fields"
    }

    fn handle(&self, store: &Store, action: Action) -> Option<Action> {
        let Action::SendOperation {
            bc_name,
            operation_type,
            widget_name,
            ..
        } = &action
        else {
            return Some(action);
        };
        let state = store.state();
        let Some(cursor) = state.screen.cursor(bc_name) else {
            return Some(action);
        };
        let bc_url = build_bc_url(&state, bc_name, true);
        let Some(row_meta) = state.view.row_meta(bc_name, &bc_url) else {
            return Some(action);
        };
        let default_save = widget_name
            .as_deref()
            .and_then(|name| state.view.widget(name))
            .and_then(|widget| widget.options.default_save.as_ref())
            == Some(operation_type);
        let saves = *operation_type == OperationType::Save
            || default_save
            || row_meta
                .operation(operation_type)
                .is_some_and(|operation| operation.auto_save_before);
        if !saves {
            return Some(action);
        }
        let Some(record) = effective_record(&state, bc_name, cursor) else {
            return Some(action);
        };

        let services = store.services();
        let message = services
            .translator
            .translate(&services.settings.required_field_message);
        let fails: FieldErrors = row_meta
            .fields
            .iter()
            .filter(|field| field.required && !field.hidden)
            .filter(|field| is_empty_value(record.get(&field.key)))
            .map(|field| (field.key.clone(), message.clone()))
            .collect();
        if fails.is_empty() {
            return Some(action);
        }

        warn!(
            bc_name = %bc_name,
            cursor = %cursor,
            fields = ?fails.keys().collect::<Vec<_>>(),
            "Operation blocked by empty required fields"
        );
        store.dispatch(Action::AddPendingValidationFails {
            bc_name: bc_name.clone(),
            cursor: cursor.to_string(),
            fails,
        });
        None
    }
}
