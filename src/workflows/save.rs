//! The standard save round trip.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info};

use super::fetch::cascade;
use super::post_invoke::dispatch_post_actions;
use super::{errors, Workflow, WorkflowContext};
use crate::model::{MessageType, OperationType, PendingDataItem};
use crate::store::selectors::build_bc_url;
use crate::store::{Action, AppState, Notification};

/// Outgoing body of a mutation: the pending delta without disabled fields,
/// plus the stored record's `vstamp`.
pub(crate) fn outgoing_payload(state: &AppState, bc_name: &str, cursor: &str) -> PendingDataItem {
    let bc_url = build_bc_url(state, bc_name, true);
    let delta = state.view.delta(bc_name, cursor).cloned().unwrap_or_default();
    let mut payload = match state.view.row_meta(bc_name, &bc_url) {
        Some(row_meta) => row_meta.strip_disabled(&delta),
        None => delta,
    };
    match state.data.record(bc_name, cursor) {
        Some(record) => {
            payload.insert("vstamp".to_string(), Value::from(record.vstamp));
        }
        None => {
            payload.remove("vstamp");
        }
    }
    payload
}

/// Handles `SendOperation` with the `save` role.
pub struct SaveWorkflow;

#[async_trait]
impl Workflow for SaveWorkflow {
    fn name(&self) -> &'static str {
        "save"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(
            action,
            Action::SendOperation {
                operation_type: OperationType::Save,
                ..
            }
        )
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::SendOperation {
            bc_name,
            widget_name,
            on_success_action,
            ..
        } = action
        else {
            return;
        };
        let state = ctx.state();
        let bc_url = build_bc_url(state, &bc_name, true);
        let Some(cursor) = state.screen.cursor(&bc_name).map(str::to_string) else {
            debug!(bc_name = %bc_name, "Nothing selected to save");
            ctx.dispatch(Action::BcSaveDataFail {
                bc_name,
                bc_url,
                cursor: None,
                field_errors: Default::default(),
            });
            return;
        };
        let payload = outgoing_payload(state, &bc_name, &cursor);

        info!(bc_name = %bc_name, bc_url = %bc_url, fields = payload.len(), "Saving record");
        match ctx.api().save_data(ctx.screen_name(), &bc_url, &payload).await {
            Ok(response) => {
                let has_record = response.record.is_some();
                ctx.dispatch(Action::BcSaveDataSuccess {
                    bc_name: bc_name.clone(),
                    cursor,
                    data_item: response.record,
                });
                if !has_record {
                    ctx.dispatch(Action::force_update(&bc_name, widget_name.clone()));
                }
                cascade(&ctx, &bc_name, widget_name.clone());
                dispatch_post_actions(
                    &ctx,
                    &bc_name,
                    widget_name.as_deref(),
                    &OperationType::Save,
                    response.post_actions,
                    None,
                );
                if let Some(next) = on_success_action {
                    ctx.dispatch(*next);
                }
            }
            Err(err) => {
                error!(bc_name = %bc_name, bc_url = %bc_url, kind = err.kind(), error = %err, "Save failed");
                ctx.dispatch(Action::BcSaveDataFail {
                    bc_name: bc_name.clone(),
                    bc_url,
                    cursor: Some(cursor),
                    field_errors: err.field_errors(),
                });
                errors::report(&ctx, &err);
                let notify = widget_name
                    .as_deref()
                    .and_then(|name| ctx.state().view.widget(name))
                    .map_or(true, |widget| !widget.options.disable_notification);
                if on_success_action.is_some() && notify {
                    let message = ctx.services().translator.translate(
                        "There are pending changes that could not be saved. Discard them?",
                    );
                    let discard = ctx.services().translator.translate("Cancel changes");
                    ctx.dispatch(Action::ShowNotification {
                        notification: Notification::new(MessageType::Error, message).with_action(
                            discard,
                            Action::BcCancelPendingChanges {
                                bc_names: Some(vec![bc_name]),
                            },
                        ),
                    });
                }
            }
        }
    }
}
