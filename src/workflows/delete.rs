//! Record removal and draft abandonment. Neither touches local rows before
//! the server confirms.

use async_trait::async_trait;
use tracing::{debug, error, info};

use super::post_invoke::dispatch_post_actions;
use super::save::outgoing_payload;
use super::{errors, Workflow, WorkflowContext};
use crate::model::OperationType;
use crate::store::selectors::build_bc_url;
use crate::store::{Action, FetchRequest};

pub struct DeleteWorkflow;

#[async_trait]
impl Workflow for DeleteWorkflow {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(
            action,
            Action::SendOperation {
                operation_type: OperationType::Delete,
                ..
            }
        )
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::SendOperation {
            bc_name,
            widget_name,
            ..
        } = action
        else {
            return;
        };
        if ctx.state().screen.cursor(&bc_name).is_none() {
            debug!(bc_name = %bc_name, "Nothing selected to delete");
            ctx.dispatch(Action::BcDeleteDataFail { bc_name });
            return;
        }
        let bc_url = build_bc_url(ctx.state(), &bc_name, true);
        info!(bc_name = %bc_name, bc_url = %bc_url, "Deleting record");
        match ctx.api().delete_data(ctx.screen_name(), &bc_url).await {
            Ok(response) => {
                ctx.dispatch(Action::BcFetchDataRequest(
                    FetchRequest::new(bc_name.clone()).widget(widget_name.clone()),
                ));
                dispatch_post_actions(
                    &ctx,
                    &bc_name,
                    widget_name.as_deref(),
                    &OperationType::Delete,
                    response.post_actions,
                    None,
                );
            }
            Err(err) => {
                error!(bc_name = %bc_name, bc_url = %bc_url, kind = err.kind(), error = %err, "Delete failed");
                ctx.dispatch(Action::BcDeleteDataFail { bc_name });
                errors::report(&ctx, &err);
            }
        }
    }
}

/// Discards a draft through the `cancel-create` custom action.
pub struct CancelCreateWorkflow;

#[async_trait]
impl Workflow for CancelCreateWorkflow {
    fn name(&self) -> &'static str {
        "cancel_create"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(
            action,
            Action::SendOperation {
                operation_type: OperationType::CancelCreate,
                ..
            }
        )
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::SendOperation {
            bc_name,
            widget_name,
            ..
        } = action
        else {
            return;
        };
        let state = ctx.state();
        let bc_url = build_bc_url(state, &bc_name, true);
        let Some(cursor) = state.screen.cursor(&bc_name).map(str::to_string) else {
            debug!(bc_name = %bc_name, "No draft selected");
            return;
        };
        let payload = outgoing_payload(state, &bc_name, &cursor);
        let params = vec![(
            "_action".to_string(),
            OperationType::CancelCreate.as_str().to_string(),
        )];

        match ctx
            .api()
            .custom_action(ctx.screen_name(), &bc_url, &payload, &params)
            .await
        {
            Ok(response) => {
                ctx.dispatch(Action::SendOperationSuccess {
                    bc_name: bc_name.clone(),
                    operation_type: OperationType::CancelCreate,
                    cursor: Some(cursor),
                    data_item: response.record,
                });
                ctx.dispatch(Action::change_cursor(&bc_name, None, false));
                dispatch_post_actions(
                    &ctx,
                    &bc_name,
                    widget_name.as_deref(),
                    &OperationType::CancelCreate,
                    response.post_actions,
                    None,
                );
            }
            Err(err) => {
                error!(bc_name = %bc_name, bc_url = %bc_url, kind = err.kind(), error = %err, "Cancel-create failed");
                ctx.dispatch(Action::SendOperationFail {
                    bc_name,
                    bc_url,
                    operation_type: OperationType::CancelCreate,
                    field_errors: err.field_errors(),
                });
                errors::report(&ctx, &err);
            }
        }
    }
}
