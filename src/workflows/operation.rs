//! Custom business actions, association popups opened as an operation, and
//! answers to confirmation dialogs.

use async_trait::async_trait;
use tracing::{debug, error, info};

use super::post_invoke::dispatch_post_actions;
use super::save::outgoing_payload;
use super::{errors, Workflow, WorkflowContext};
use crate::api::query;
use crate::model::{ConfirmType, OperationType, PendingDataItem, PopupData, PostAction};
use crate::store::selectors::build_bc_url;
use crate::store::{Action, Modal};

/// Confirmation token sent for a plain yes/no answer.
const CONFIRM_OK: &str = "ok";

/// Handles `SendOperation` for every non-CRUD operation type.
pub struct CustomOperationWorkflow;

#[async_trait]
impl Workflow for CustomOperationWorkflow {
    fn name(&self) -> &'static str {
        "custom_operation"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(
            action,
            Action::SendOperation {
                operation_type: OperationType::Custom(_),
                ..
            }
        )
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::SendOperation {
            bc_name,
            operation_type,
            widget_name,
            on_success_action,
            confirm,
        } = action
        else {
            return;
        };
        let state = ctx.state();
        let bc_url = build_bc_url(state, &bc_name, true);
        let cursor = state.screen.cursor(&bc_name).map(str::to_string);
        let payload = cursor
            .as_deref()
            .map(|cursor| outgoing_payload(state, &bc_name, cursor))
            .unwrap_or_else(PendingDataItem::new);
        let filters = state.screen.filters.get(&bc_name).map(Vec::as_slice).unwrap_or(&[]);
        let sorters = state.screen.sorters.get(&bc_name).map(Vec::as_slice).unwrap_or(&[]);
        let mut params = query::context(filters, sorters);
        params.push(("_action".to_string(), operation_type.as_str().to_string()));
        if let Some(confirm) = &confirm {
            params.push(("_confirm".to_string(), confirm.clone()));
        }
        // A widget's stand-in save that runs ahead of a navigation.
        let default_save = widget_name
            .as_deref()
            .and_then(|name| state.view.widget(name))
            .and_then(|widget| widget.options.default_save.as_ref())
            == Some(&operation_type)
            && on_success_action
                .as_deref()
                .is_some_and(Action::is_navigation);

        info!(bc_name = %bc_name, bc_url = %bc_url, operation = operation_type.as_str(), "Sending operation");
        let response = match ctx
            .api()
            .custom_action(ctx.screen_name(), &bc_url, &payload, &params)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!(
                    bc_name = %bc_name,
                    operation = operation_type.as_str(),
                    kind = err.kind(),
                    error = %err,
                    "Operation failed"
                );
                ctx.dispatch(Action::SendOperationFail {
                    bc_name,
                    bc_url,
                    operation_type,
                    field_errors: err.field_errors(),
                });
                errors::report(&ctx, &err);
                return;
            }
        };

        ctx.dispatch(Action::SendOperationSuccess {
            bc_name: bc_name.clone(),
            operation_type: operation_type.clone(),
            cursor,
            data_item: response.record,
        });
        ctx.dispatch(Action::force_update(&bc_name, widget_name.clone()));

        if default_save {
            ctx.dispatch(Action::BcCancelPendingChanges {
                bc_names: Some(vec![bc_name.clone()]),
            });
            if let Some(next) = on_success_action {
                ctx.dispatch(*next);
            }
            return;
        }

        // A server-side confirmation holds the continuation until the resend succeeds.
        let awaits_confirmation = response
            .post_actions
            .iter()
            .any(|post_action| matches!(post_action, PostAction::Confirm(_)));
        dispatch_post_actions(
            &ctx,
            &bc_name,
            widget_name.as_deref(),
            &operation_type,
            response.post_actions,
            on_success_action.as_deref(),
        );
        if let Some(pre_invoke) = response.pre_invoke {
            ctx.dispatch(Action::ProcessPreInvoke {
                bc_name,
                operation_type,
                widget_name,
                pre_invoke,
                on_success_action: None,
            });
        }
        if let Some(next) = on_success_action.filter(|_| !awaits_confirmation) {
            ctx.dispatch(*next);
        }
    }
}

/// The `associate` operation opens an active association popup.
pub struct AssociateOperationWorkflow;

#[async_trait]
impl Workflow for AssociateOperationWorkflow {
    fn name(&self) -> &'static str {
        "associate_operation"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(
            action,
            Action::SendOperation {
                operation_type: OperationType::Associate,
                ..
            }
        )
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::SendOperation { bc_name, .. } = action else {
            return;
        };
        let state = ctx.state();
        let bc_url = build_bc_url(state, &bc_name, true);
        let popup_bc_name = state
            .view
            .row_meta(&bc_name, &bc_url)
            .and_then(|row_meta| row_meta.operation(&OperationType::Associate))
            .and_then(|operation| operation.bc_key.clone())
            .unwrap_or_else(|| format!("{}Assoc", bc_name));
        let widget_name = state
            .view
            .widget_of(&popup_bc_name)
            .map(|widget| widget.name.clone());
        ctx.dispatch(Action::ShowViewPopup {
            popup: PopupData {
                bc_name: popup_bc_name,
                callee_bc_name: Some(bc_name),
                associate_field_key: None,
                assoc_value_key: None,
                widget_name,
                active: true,
            },
        });
    }
}

/// Re-sends the operation behind an approved dialog with `_confirm`.
pub struct ConfirmationWorkflow;

#[async_trait]
impl Workflow for ConfirmationWorkflow {
    fn name(&self) -> &'static str {
        "confirmation"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::ResolveConfirmation { .. })
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::ResolveConfirmation { approved, text } = action else {
            return;
        };
        let Some(modal) = ctx.previous().view.modal.clone() else {
            return;
        };
        if !approved {
            debug!("Operation declined");
            return;
        }
        let (bc_name, operation_type, widget_name, on_success_action, token) = match modal {
            Modal::PreInvoke {
                bc_name,
                operation_type,
                widget_name,
                on_success_action,
                ..
            } => (
                bc_name,
                operation_type,
                widget_name,
                on_success_action,
                CONFIRM_OK.to_string(),
            ),
            Modal::Confirm {
                bc_name,
                operation_type,
                widget_name,
                confirm,
                on_success_action,
            } => {
                let token = match confirm.kind {
                    ConfirmType::Confirm => CONFIRM_OK.to_string(),
                    ConfirmType::ConfirmText => text.unwrap_or_default(),
                };
                (bc_name, operation_type, widget_name, on_success_action, token)
            }
        };
        ctx.dispatch(Action::SendOperation {
            bc_name,
            operation_type,
            widget_name,
            on_success_action,
            confirm: Some(token),
        });
    }
}
