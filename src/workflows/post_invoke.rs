//! Server-declared follow-ups of a successful operation.

use async_trait::async_trait;
use tracing::debug;

use super::{Workflow, WorkflowContext};
use crate::model::{OperationPostInvoke, OperationType, PostAction};
use crate::store::{Action, Notification};

/// Queues every post action of a response, in order.
///
/// `continuation` is parked in any confirmation dialog the response asks for.
pub(crate) fn dispatch_post_actions(
    ctx: &WorkflowContext,
    bc_name: &str,
    widget_name: Option<&str>,
    operation_type: &OperationType,
    post_actions: Vec<PostAction>,
    continuation: Option<&Action>,
) {
    for post_action in post_actions {
        match post_action {
            PostAction::Invoke(post_invoke) => ctx.dispatch(Action::ProcessPostInvoke {
                bc_name: bc_name.to_string(),
                widget_name: widget_name.map(str::to_string),
                post_invoke,
            }),
            PostAction::Confirm(confirm) => ctx.dispatch(Action::OperationConfirmation {
                bc_name: bc_name.to_string(),
                operation_type: operation_type.clone(),
                widget_name: widget_name.map(str::to_string),
                confirm,
                on_success_action: continuation.cloned().map(Box::new),
            }),
        }
    }
}

/// Executes `ProcessPostInvoke`.
pub struct PostInvokeWorkflow;

#[async_trait]
impl Workflow for PostInvokeWorkflow {
    fn name(&self) -> &'static str {
        "post_invoke"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::ProcessPostInvoke { .. })
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::ProcessPostInvoke {
            bc_name,
            widget_name,
            post_invoke,
        } = action
        else {
            return;
        };
        match post_invoke {
            OperationPostInvoke::RefreshBc { bc_name: target } => {
                let target = if target.is_empty() { bc_name } else { target };
                let widget_name = ctx
                    .state()
                    .view
                    .widget_of(&target)
                    .map(|widget| widget.name.clone());
                ctx.dispatch(Action::force_update(&target, widget_name));
            }
            OperationPostInvoke::DrillDown {
                url,
                drill_down_type,
            } => ctx.dispatch(Action::DrillDown {
                url,
                drill_down_type,
            }),
            OperationPostInvoke::ShowMessage {
                message_type,
                message_text,
            } => ctx.dispatch(Action::ShowNotification {
                notification: Notification::new(message_type, message_text),
            }),
            OperationPostInvoke::DownloadFile { file_id } => {
                ctx.services()
                    .navigator
                    .download(&format!("file?id={}", file_id));
            }
            OperationPostInvoke::DownloadFileByUrl { url } => {
                ctx.services().navigator.download(&url);
            }
            OperationPostInvoke::PostDelete => {
                ctx.dispatch(Action::change_cursor(&bc_name, None, false));
                ctx.dispatch(Action::force_update(&bc_name, widget_name));
            }
            OperationPostInvoke::Other { kind, .. } => {
                debug!(bc_name = %bc_name, kind = %kind, "Post action left to the host application");
            }
        }
    }
}
