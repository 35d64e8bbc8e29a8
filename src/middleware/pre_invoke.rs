use tracing::debug;

use super::Middleware;
use crate::model::{MessageType, PreInvokeType};
use crate::store::selectors::build_bc_url;
use crate::store::{Action, Notification, Store};

/// Shows the row-meta pre-invoke of an operation before it is sent.
///
/// `confirm` prompts hold the operation until the user answers, `info`
/// prompts let it through, `error` prompts stop it.
pub struct PreInvokeMiddleware;

impl Middleware for PreInvokeMiddleware {
    fn name(&self) -> &'static str {
        "pre_invoke"
    }

    fn handle(&self, store: &Store, action: Action) -> Option<Action> {
        let Action::SendOperation {
            bc_name,
            operation_type,
            widget_name,
            on_success_action,
            confirm: None,
        } = &action
        else {
            return Some(action);
        };
        let state = store.state();
        let bc_url = build_bc_url(&state, bc_name, true);
        let Some(pre_invoke) = state
            .view
            .row_meta(bc_name, &bc_url)
            .and_then(|row_meta| row_meta.operation(operation_type))
            .and_then(|operation| operation.pre_invoke.clone())
        else {
            return Some(action);
        };

        debug!(
            bc_name = %bc_name,
            operation = operation_type.as_str(),
            kind = ?pre_invoke.kind,
            "Pre-invoke"
        );
        match pre_invoke.kind {
            PreInvokeType::Confirm => {
                store.dispatch(Action::ProcessPreInvoke {
                    bc_name: bc_name.clone(),
                    operation_type: operation_type.clone(),
                    widget_name: widget_name.clone(),
                    pre_invoke,
                    on_success_action: on_success_action.clone(),
                });
                None
            }
            PreInvokeType::Info => {
                store.dispatch(Action::ShowNotification {
                    notification: Notification::new(MessageType::Info, pre_invoke.message),
                });
                Some(action)
            }
            PreInvokeType::Error => {
                store.dispatch(Action::ShowNotification {
                    notification: Notification::new(MessageType::Error, pre_invoke.message),
                });
                None
            }
        }
    }
}
