//! View selection, routing and the actions that simply refetch a BC.

use async_trait::async_trait;
use tracing::debug;

use super::fetch::cascade;
use super::{Workflow, WorkflowContext};
use crate::store::selectors::root_fetches;
use crate::store::{Action, FetchRequest};

/// Loads the root BCs of a freshly selected view.
pub struct SelectViewWorkflow;

#[async_trait]
impl Workflow for SelectViewWorkflow {
    fn name(&self) -> &'static str {
        "select_view"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::SelectView { .. })
    }

    async fn run(&self, _action: Action, ctx: WorkflowContext) {
        for (bc_name, widget_name) in root_fetches(ctx.state()) {
            ctx.dispatch(Action::BcFetchDataRequest(
                FetchRequest::new(bc_name).widget(widget_name),
            ));
        }
    }
}

/// Follows a route change: switches the view, or reloads from the
/// shallowest BC whose cursor the route moved.
pub struct ChangeLocationWorkflow;

#[async_trait]
impl Workflow for ChangeLocationWorkflow {
    fn name(&self) -> &'static str {
        "change_location"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::ChangeLocation { .. })
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::ChangeLocation { route } = action else {
            return;
        };
        let state = ctx.state();
        if route.screen != state.screen.screen_name {
            debug!(screen = %route.screen, "Route points to a screen that is not loaded");
            return;
        }
        let target = match route.view.as_deref() {
            Some(name) => state.screen.view(name),
            None => state
                .screen
                .primary_view
                .as_deref()
                .and_then(|name| state.screen.view(name))
                .or_else(|| state.screen.views.first()),
        };
        match target {
            Some(view) if view.name != state.view.name => {
                ctx.dispatch(Action::SelectView { view: view.clone() });
            }
            Some(_) => {
                let previous = ctx.previous();
                let moved = route
                    .bc_cursors()
                    .into_iter()
                    .find(|(bc_name, id)| previous.screen.cursor(bc_name) != Some(id.as_str()));
                if let Some((bc_name, cursor)) = moved {
                    ctx.dispatch(Action::BcSelectRecord { bc_name, cursor });
                }
            }
            None => debug!(view = ?route.view, "Route points to an unknown view"),
        }
    }
}

/// Paging, filtering, sorting and forced reloads all end in a refetch.
pub struct RefreshWorkflow;

#[async_trait]
impl Workflow for RefreshWorkflow {
    fn name(&self) -> &'static str {
        "refresh"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(
            action,
            Action::BcForceUpdate { .. }
                | Action::BcLoadMore { .. }
                | Action::BcChangePage { .. }
                | Action::BcAddFilter { .. }
                | Action::BcRemoveFilter { .. }
                | Action::BcRemoveAllFilters { .. }
                | Action::BcAddSorter { .. }
        )
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let request = match action {
            Action::BcLoadMore {
                bc_name,
                widget_name,
            } => FetchRequest::new(bc_name).widget(widget_name).load_more(),
            Action::BcForceUpdate {
                bc_name,
                widget_name,
            }
            | Action::BcChangePage {
                bc_name,
                widget_name,
                ..
            }
            | Action::BcAddFilter {
                bc_name,
                widget_name,
                ..
            }
            | Action::BcRemoveFilter {
                bc_name,
                widget_name,
                ..
            }
            | Action::BcRemoveAllFilters {
                bc_name,
                widget_name,
            }
            | Action::BcAddSorter {
                bc_name,
                widget_name,
                ..
            } => FetchRequest::new(bc_name).widget(widget_name),
            _ => return,
        };
        ctx.dispatch(Action::BcFetchDataRequest(request));
    }
}

/// Record selection by the user.
pub struct SelectRecordWorkflow;

#[async_trait]
impl Workflow for SelectRecordWorkflow {
    fn name(&self) -> &'static str {
        "select_record"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(
            action,
            Action::BcSelectRecord { .. } | Action::BcSelectDepthRecord { .. }
        )
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        match action {
            Action::BcSelectRecord { bc_name, .. } => {
                let widget_name = ctx
                    .state()
                    .view
                    .widget_of(&bc_name)
                    .map(|widget| widget.name.clone());
                cascade(&ctx, &bc_name, widget_name);
            }
            Action::BcSelectDepthRecord {
                bc_name,
                widget_name,
                depth,
                ..
            } => {
                if depth < ctx.settings().hierarchy_max_depth {
                    ctx.dispatch(Action::BcFetchDataRequest(
                        FetchRequest::new(bc_name).widget(widget_name).depth(depth + 1),
                    ));
                }
            }
            _ => {}
        }
    }
}

/// Focusing a table cell selects the row it belongs to.
pub struct SelectCellWorkflow;

#[async_trait]
impl Workflow for SelectCellWorkflow {
    fn name(&self) -> &'static str {
        "select_cell"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::SelectTableCellInit { .. })
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::SelectTableCellInit {
            widget_name,
            row_id,
            ..
        } = action
        else {
            return;
        };
        let state = ctx.state();
        let Some(widget) = state.view.widget(&widget_name) else {
            return;
        };
        if state.screen.cursor(&widget.bc_name) == Some(row_id.as_str()) {
            return;
        }
        debug!(bc_name = %widget.bc_name, cursor = %row_id, "Selecting row of focused cell");
        ctx.dispatch(Action::BcSelectRecord {
            bc_name: widget.bc_name.clone(),
            cursor: row_id,
        });
    }
}
