//! Row-meta loading, including the force-active recalculation round trip.

use async_trait::async_trait;
use tracing::{debug, error};

use super::{errors, Workflow, WorkflowContext};
use crate::store::selectors::build_bc_url;
use crate::store::{Action, RequestKind};

/// Handles `BcFetchRowMeta` for the BC's current record.
pub struct RowMetaWorkflow;

#[async_trait]
impl Workflow for RowMetaWorkflow {
    fn name(&self) -> &'static str {
        "row_meta"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::BcFetchRowMeta { .. })
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::BcFetchRowMeta { bc_name, .. } = action else {
            return;
        };
        let state = ctx.state();
        let bc_url = build_bc_url(state, &bc_name, true);
        let fail = || Action::BcFetchRowMetaFail {
            bc_name: bc_name.clone(),
            bc_url: bc_url.clone(),
        };
        if state.screen.cursor(&bc_name).is_none() {
            debug!(bc_name = %bc_name, "No record selected, row meta skipped");
            ctx.dispatch(fail());
            return;
        }

        let registry = ctx.cancel_registry();
        let ticket = registry.begin(&bc_name, RequestKind::RowMeta);
        let outcome = tokio::select! {
            biased;
            _ = ticket.token().cancelled() => None,
            result = ctx.api().fetch_row_meta(ctx.screen_name(), &bc_url) => Some(result),
        };
        registry.finish(&ticket);

        match outcome {
            Some(Ok(row_meta)) if !ctx.is_stale() => ctx.dispatch(Action::BcFetchRowMetaSuccess {
                bc_name: bc_name.clone(),
                bc_url: bc_url.clone(),
                row_meta,
                cursor: None,
            }),
            Some(Err(err)) if !ctx.is_stale() => {
                error!(bc_name = %bc_name, bc_url = %bc_url, kind = err.kind(), error = %err, "Row meta fetch failed");
                ctx.dispatch(fail());
                errors::report(&ctx, &err);
            }
            _ => {
                if !ctx.is_stale() && !registry.has_pending(&ticket) {
                    ctx.dispatch(fail());
                }
            }
        }
    }
}

/// Posts the edited record back to `row-meta` when a force-active field changes.
pub struct ForceActiveWorkflow;

#[async_trait]
impl Workflow for ForceActiveWorkflow {
    fn name(&self) -> &'static str {
        "force_active"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::ChangeDataItem { .. })
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::ChangeDataItem {
            bc_name,
            cursor,
            data_item,
        } = action
        else {
            return;
        };
        let state = ctx.state();
        let bc_url = build_bc_url(state, &bc_name, true);
        let Some(row_meta) = state.view.row_meta(&bc_name, &bc_url) else {
            return;
        };
        if !data_item.keys().any(|key| row_meta.is_force_active(key)) {
            return;
        }
        let Some(stored) = state.data.record(&bc_name, &cursor) else {
            return;
        };
        let payload = stored.merged(state.view.delta(&bc_name, &cursor)).to_object();

        debug!(bc_name = %bc_name, cursor = %cursor, "Recalculating force-active fields");
        let result = ctx
            .api()
            .force_active_row_meta(ctx.screen_name(), &bc_url, &payload)
            .await;
        if ctx.is_stale() {
            return;
        }
        match result {
            Ok(row_meta) => {
                let current_record = ctx
                    .current()
                    .data
                    .record(&bc_name, &cursor)
                    .cloned()
                    .unwrap_or_else(|| stored.clone());
                ctx.dispatch(Action::ForceActiveRmUpdate {
                    bc_name,
                    bc_url,
                    cursor,
                    current_record,
                    row_meta,
                });
            }
            Err(err) => {
                error!(bc_name = %bc_name, bc_url = %bc_url, kind = err.kind(), error = %err, "Force-active update failed");
                ctx.dispatch(Action::ForceActiveChangeFail {
                    bc_name,
                    bc_url,
                    cursor,
                    field_errors: err.field_errors(),
                });
                errors::report(&ctx, &err);
            }
        }
    }
}
