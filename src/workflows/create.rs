use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, warn};

use super::post_invoke::dispatch_post_actions;
use super::{errors, Workflow, WorkflowContext};
use crate::model::{DataItem, OperationType, PendingDataItem, NEW_RECORD_VSTAMP};
use crate::store::selectors::build_bc_url;
use crate::store::Action;

/// Asks the backend for a draft record and selects it.
///
/// Nothing is stored before the server hands out the draft id.
pub struct CreateWorkflow;

#[async_trait]
impl Workflow for CreateWorkflow {
    fn name(&self) -> &'static str {
        "create"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(
            action,
            Action::SendOperation {
                operation_type: OperationType::Create,
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
        let bc_url = build_bc_url(ctx.state(), &bc_name, false);
        let response = match ctx.api().new_row_meta(ctx.screen_name(), &bc_url).await {
            Ok(response) => response,
            Err(err) => {
                error!(bc_name = %bc_name, bc_url = %bc_url, kind = err.kind(), error = %err, "Create failed");
                ctx.dispatch(Action::BcNewDataFail { bc_name });
                errors::report(&ctx, &err);
                return;
            }
        };
        if ctx.is_stale() {
            return;
        }
        let Some(id) = response.row.draft_id() else {
            warn!(bc_name = %bc_name, "Draft row meta carries no id");
            ctx.dispatch(Action::BcNewDataFail { bc_name });
            return;
        };

        let mut draft = DataItem::new(id.clone(), NEW_RECORD_VSTAMP);
        for field in &response.row.fields {
            if field.key != "id" && field.key != "vstamp" {
                draft
                    .fields
                    .insert(field.key.clone(), field.current_value.clone());
            }
        }
        let record_url = if bc_url.is_empty() {
            id.clone()
        } else {
            format!("{}/{}", bc_url, id)
        };
        info!(bc_name = %bc_name, id = %id, "Draft record created");

        ctx.dispatch(Action::BcNewDataSuccess {
            bc_name: bc_name.clone(),
            bc_url,
            data_item: draft,
        });
        ctx.dispatch(Action::BcFetchRowMetaSuccess {
            bc_name: bc_name.clone(),
            bc_url: record_url,
            row_meta: response.row,
            cursor: Some(id.clone()),
        });
        let mut shell = PendingDataItem::new();
        shell.insert("id".to_string(), Value::String(id.clone()));
        ctx.dispatch(Action::ChangeDataItem {
            bc_name: bc_name.clone(),
            cursor: id,
            data_item: shell,
        });
        dispatch_post_actions(
            &ctx,
            &bc_name,
            widget_name.as_deref(),
            &OperationType::Create,
            response.post_actions,
            None,
        );
    }
}
