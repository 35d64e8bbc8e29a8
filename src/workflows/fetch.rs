//! BC data loading and the cascade that follows a cursor change.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};

use super::{errors, Workflow, WorkflowContext};
use crate::api::{query, ApiError, FetchDataResponse, QueryParams};
use crate::model::{BcFilter, BcMetaState, DataItem, FilterType};
use crate::store::selectors::{
    build_bc_url, child_fetches, keeps_delta, route_targets, same_bc_hierarchy,
};
use crate::store::{Action, AppState, FetchRequest, RequestKind};

/// Handles `BcFetchDataRequest`.
pub struct FetchWorkflow;

#[async_trait]
impl Workflow for FetchWorkflow {
    fn name(&self) -> &'static str {
        "fetch"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::BcFetchDataRequest(_))
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        if let Action::BcFetchDataRequest(request) = action {
            fetch(&ctx, request).await;
        }
    }
}

/// Row-meta of the current record, then either the next hierarchy level or
/// every child BC on the view.
pub(crate) fn cascade(ctx: &WorkflowContext, bc_name: &str, widget_name: Option<String>) {
    ctx.dispatch(Action::BcFetchRowMeta {
        bc_name: bc_name.to_string(),
        widget_name: widget_name.clone(),
    });
    let state = ctx.current();
    let hierarchy = same_bc_hierarchy(&state, bc_name, widget_name.as_deref())
        .filter(|_| ctx.settings().hierarchy_max_depth >= 2);
    match hierarchy {
        Some(widget) => ctx.dispatch(Action::BcFetchDataRequest(
            FetchRequest::new(bc_name)
                .widget(Some(widget.name.clone()))
                .depth(2),
        )),
        None => {
            for (child, widget) in child_fetches(&state, bc_name) {
                ctx.dispatch(Action::BcFetchDataRequest(
                    FetchRequest::new(child).widget(widget),
                ));
            }
        }
    }
}

/// Filters sent with the request, including the parent-key filter of a
/// same-BC hierarchy level. `None` when a level has no parent selected.
fn request_filters(state: &AppState, bc: &BcMetaState, request: &FetchRequest) -> Option<Vec<BcFilter>> {
    let mut filters = state.screen.filters.get(&bc.name).cloned().unwrap_or_default();
    let Some(widget) = same_bc_hierarchy(state, &bc.name, request.widget_name.as_deref()) else {
        return Some(filters);
    };
    let depth = request.level();
    let parent_key = widget.parent_key();
    if depth == 1 {
        filters.push(BcFilter::new(parent_key, FilterType::Specified, Value::Bool(false)));
    } else {
        let parent = bc.cursor_at(Some(depth - 1))?;
        filters.push(BcFilter::new(
            parent_key,
            FilterType::Equals,
            Value::String(parent.to_string()),
        ));
    }
    Some(filters)
}

fn request_query(state: &AppState, bc: &BcMetaState, request: &FetchRequest, default_limit: usize, filters: &[BcFilter]) -> QueryParams {
    let limit = if request.ignore_page_limit {
        0
    } else {
        bc.limit.unwrap_or(default_limit)
    };
    let (page, limit) = match request.pages {
        Some((from, to)) => (from, limit.saturating_mul(to.saturating_sub(from).saturating_add(1))),
        None if request.level() > 1 => (1, limit),
        None => (bc.page.max(1), limit),
    };
    let sorters = state
        .screen
        .sorters
        .get(&bc.name)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let mut params = query::pagination(page, limit);
    params.extend(query::context(filters, sorters));
    params
}

/// Keeps `previous` when it is still among `records`, else picks the first row.
fn next_cursor(previous: Option<&str>, records: &[DataItem]) -> Option<String> {
    previous
        .filter(|cursor| records.iter().any(|record| record.id == *cursor))
        .map(str::to_string)
        .or_else(|| records.first().map(|record| record.id.clone()))
}

enum Outcome {
    Cancelled,
    Done(Result<FetchDataResponse, ApiError>),
}

async fn fetch(ctx: &WorkflowContext, request: FetchRequest) {
    let state = ctx.state();
    let bc_name = request.bc_name.as_str();
    let Some(bc) = state.screen.bc(bc_name) else {
        debug!(bc_name = %bc_name, "Fetch requested for a BC missing from the screen");
        return;
    };
    let depth = request.level();
    let depth_field = (depth > 1).then_some(depth);
    let bc_url = build_bc_url(state, bc_name, route_targets(state, bc_name));
    let fail = || Action::BcFetchDataFail {
        bc_name: bc_name.to_string(),
        bc_url: bc_url.clone(),
        depth: depth_field,
    };

    let Some(filters) = request_filters(state, bc, &request) else {
        debug!(bc_name = %bc_name, depth, "No parent record selected for hierarchy level");
        ctx.dispatch(fail());
        return;
    };
    let params = request_query(state, bc, &request, ctx.settings().page_limit, &filters);

    let kind = match depth_field {
        Some(level) => RequestKind::DepthFetch(level),
        None => RequestKind::Fetch,
    };
    let registry = ctx.cancel_registry();
    let ticket = registry.begin(bc_name, kind);
    debug!(bc_name = %bc_name, bc_url = %bc_url, depth, "Fetching BC data");
    let outcome = tokio::select! {
        biased;
        _ = ticket.token().cancelled() => Outcome::Cancelled,
        result = ctx.api().fetch_data(ctx.screen_name(), &bc_url, &params) => Outcome::Done(result),
    };
    registry.finish(&ticket);

    let response = match outcome {
        Outcome::Done(Ok(response)) if !ctx.is_stale() => response,
        Outcome::Done(Err(err)) if !ctx.is_stale() => {
            error!(bc_name = %bc_name, bc_url = %bc_url, kind = err.kind(), error = %err, "Fetch failed");
            ctx.dispatch(fail());
            errors::report(ctx, &err);
            return;
        }
        _ => {
            // A newer view or a newer request for the same slot owns the loading flag.
            debug!(bc_name = %bc_name, depth, "Fetch result discarded");
            if !ctx.is_stale() && !registry.has_pending(&ticket) {
                ctx.dispatch(fail());
            }
            return;
        }
    };

    let FetchDataResponse { data, has_next } = response;
    let live = ctx.current();
    let widget_name = request.widget_name.clone();

    if let Some(level) = depth_field {
        let previous = live.screen.bc(bc_name).and_then(|bc| bc.cursor_at(Some(level)));
        let cursor = next_cursor(previous, &data);
        ctx.dispatch(Action::BcChangeDepthCursor {
            bc_name: bc_name.to_string(),
            depth: level,
            cursor: cursor.clone(),
        });
        ctx.dispatch(Action::BcFetchDataSuccess {
            bc_name: bc_name.to_string(),
            bc_url,
            data,
            has_next,
            depth: depth_field,
            append: false,
        });
        if cursor.is_some() && level < ctx.settings().hierarchy_max_depth {
            ctx.dispatch(Action::BcFetchDataRequest(
                FetchRequest::new(bc_name).widget(widget_name).depth(level + 1),
            ));
        }
        return;
    }

    let previous = live.screen.cursor(bc_name);
    let cursor = match previous {
        // Appended pages never move the selection off an already loaded row.
        Some(current) if request.load_more && live.data.record(bc_name, current).is_some() => {
            Some(current.to_string())
        }
        _ => next_cursor(previous, &data),
    };
    let keep_delta = request.keep_delta || request.load_more || keeps_delta(&live, bc_name);
    let mut cursors = BTreeMap::new();
    cursors.insert(bc_name.to_string(), cursor.clone());
    ctx.dispatch(Action::BcChangeCursors {
        cursors,
        keep_delta,
    });
    ctx.dispatch(Action::BcFetchDataSuccess {
        bc_name: bc_name.to_string(),
        bc_url,
        data,
        has_next,
        depth: None,
        append: request.load_more,
    });
    if cursor.is_some() {
        cascade(ctx, bc_name, widget_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_cursor_keeps_selection_that_is_still_loaded() {
        let records = vec![DataItem::new("1", 0), DataItem::new("2", 0)];
        assert_eq!(next_cursor(Some("2"), &records), Some("2".to_string()));
        assert_eq!(next_cursor(Some("9"), &records), Some("1".to_string()));
        assert_eq!(next_cursor(None, &[]), None);
    }

    #[test]
    fn page_range_widens_the_limit() {
        let mut state = AppState::default();
        let bc = BcMetaState {
            name: "customer".into(),
            page: 3,
            ..BcMetaState::default()
        };
        state.screen.bo.insert("customer".into(), bc.clone());

        let params = request_query(&state, &bc, &FetchRequest::new("customer").pages(2, 4), 30, &[]);
        assert_eq!(params[0], ("_page".to_string(), "2".to_string()));
        assert_eq!(params[1], ("_limit".to_string(), "90".to_string()));

        let params = request_query(&state, &bc, &FetchRequest::new("customer").ignore_page_limit(), 30, &[]);
        assert_eq!(params[0].1, "3");
        assert_eq!(params[1].1, "0");
    }

    #[test]
    fn extreme_page_range_saturates_the_limit() {
        let bc = BcMetaState {
            name: "customer".into(),
            ..BcMetaState::default()
        };
        let state = AppState::default();
        let request = FetchRequest::new("customer").pages(0, usize::MAX);
        let params = request_query(&state, &bc, &request, 30, &[]);
        assert_eq!(params[1], ("_limit".to_string(), usize::MAX.to_string()));
    }

    #[test]
    fn hierarchy_levels_filter_on_the_parent_key() {
        let mut state = AppState::default();
        let mut widget = crate::model::WidgetMeta::new("tree", "List", "region");
        widget.options.hierarchy_same_bc = true;
        state.view.widgets = vec![widget];
        let mut bc = BcMetaState {
            name: "region".into(),
            cursor: Some("5".into()),
            ..BcMetaState::default()
        };

        let roots = request_filters(&state, &bc, &FetchRequest::new("region")).unwrap();
        assert_eq!(roots[0].filter_type, FilterType::Specified);
        assert_eq!(roots[0].value, Value::Bool(false));

        let level = request_filters(&state, &bc, &FetchRequest::new("region").depth(2)).unwrap();
        assert_eq!(level[0].field_name, "parentId");
        assert_eq!(level[0].value, Value::String("5".into()));

        assert!(request_filters(&state, &bc, &FetchRequest::new("region").depth(3)).is_none());
        bc.cursor = None;
        assert!(request_filters(&state, &bc, &FetchRequest::new("region").depth(2)).is_none());
    }
}
