//! Read-only queries over the state tree.

use std::collections::BTreeSet;

use super::state::AppState;
use crate::model::{
    delta_associate, is_association_delta, DataItem, PendingDataItem, WidgetMeta, ID_PLACEHOLDER,
};

/// BC names from the root ancestor down to `bc_name` itself.
pub fn ancestors<'a>(state: &'a AppState, bc_name: &'a str) -> Vec<&'a str> {
    let mut chain = vec![bc_name];
    let mut current = bc_name;
    while let Some(parent) = state
        .screen
        .bc(current)
        .and_then(|bc| bc.parent_name.as_deref())
    {
        if chain.contains(&parent) {
            break;
        }
        chain.push(parent);
        current = parent;
    }
    chain.reverse();
    chain
}

/// Resolves the url template of `bc_name` with the cursors of its ancestors.
///
/// The BC's own `:id` is filled only with `include_self` and a cursor set;
/// otherwise the placeholder is dropped. A template without its own `:id`
/// gets the cursor appended when `include_self` is requested.
pub fn build_bc_url(state: &AppState, bc_name: &str, include_self: bool) -> String {
    let Some(bc) = state.screen.bc(bc_name) else {
        return bc_name.to_string();
    };
    let chain = ancestors(state, bc_name);
    let segments: Vec<&str> = bc.url.split('/').filter(|s| !s.is_empty()).collect();
    let placeholders = segments.iter().filter(|s| **s == ID_PLACEHOLDER).count();
    let own_cursor = bc.cursor.as_deref().filter(|_| include_self);

    let mut resolved: Vec<&str> = Vec::with_capacity(segments.len() + 1);
    let mut index = 0;
    for segment in segments {
        if segment != ID_PLACEHOLDER {
            resolved.push(segment);
            continue;
        }
        let owner = chain.get(index).copied().unwrap_or(bc_name);
        index += 1;
        let cursor = if owner == bc_name {
            own_cursor
        } else {
            state.screen.cursor(owner)
        };
        if let Some(cursor) = cursor {
            resolved.push(cursor);
        }
    }
    if placeholders < chain.len() {
        if let Some(cursor) = own_cursor {
            resolved.push(cursor);
        }
    }
    resolved.join("/")
}

/// Record with its pending delta applied.
pub fn effective_record(state: &AppState, bc_name: &str, cursor: &str) -> Option<DataItem> {
    let record = state.data.record(bc_name, cursor)?;
    Some(record.merged(state.view.delta(bc_name, cursor)))
}

/// Association state of a row: the delta wins over what the server sent.
pub fn is_selected(record: &DataItem, delta: Option<&PendingDataItem>) -> bool {
    delta
        .and_then(delta_associate)
        .or_else(|| record.associated())
        .unwrap_or(false)
}

/// BCs whose selected record has unsaved field edits and is not being saved
/// already, in edit order.
///
/// Edits parked on other rows do not count: a save only ever sends the
/// cursor's delta.
pub fn dirty_bcs(state: &AppState) -> Vec<String> {
    let view = &state.view;
    view.pending
        .iter()
        .filter(|(bc_name, _)| !view.saving.contains(bc_name.as_str()))
        .filter(|(bc_name, deltas)| {
            state
                .screen
                .cursor(bc_name)
                .and_then(|cursor| deltas.get(cursor))
                .is_some_and(|delta| !delta.is_empty() && !is_association_delta(delta))
        })
        .map(|(bc_name, _)| bc_name.clone())
        .collect()
}

fn unique_fetches<'a>(widgets: impl Iterator<Item = &'a WidgetMeta>) -> Vec<(String, Option<String>)> {
    let mut seen = BTreeSet::new();
    widgets
        .filter(|widget| !widget.is_popup())
        .filter(|widget| seen.insert(widget.bc_name.clone()))
        .map(|widget| (widget.bc_name.clone(), Some(widget.name.clone())))
        .collect()
}

/// Child BCs of `bc_name` shown on the view, one entry per BC with its first widget.
pub fn child_fetches(state: &AppState, bc_name: &str) -> Vec<(String, Option<String>)> {
    unique_fetches(state.view.widgets.iter().filter(|widget| {
        state
            .screen
            .bc(&widget.bc_name)
            .and_then(|bc| bc.parent_name.as_deref())
            == Some(bc_name)
    }))
}

/// BCs of the view whose parent is not on the view itself.
pub fn root_fetches(state: &AppState) -> Vec<(String, Option<String>)> {
    let on_view: BTreeSet<&str> = state
        .view
        .widgets
        .iter()
        .map(|widget| widget.bc_name.as_str())
        .collect();
    unique_fetches(state.view.widgets.iter().filter(|widget| {
        match state.screen.bc(&widget.bc_name) {
            Some(bc) => bc
                .parent_name
                .as_deref()
                .map_or(true, |parent| !on_view.contains(parent)),
            None => false,
        }
    }))
}

/// Whether the current route addresses a record of `bc_name`.
pub fn route_targets(state: &AppState, bc_name: &str) -> bool {
    state.router.route.as_ref().is_some_and(|route| {
        route.screen == state.screen.screen_name && route.cursor_of(bc_name).is_some()
    })
}

/// Popup and hierarchy BCs keep their deltas across refetches.
pub fn keeps_delta(state: &AppState, bc_name: &str) -> bool {
    let popup = state
        .view
        .popup
        .as_ref()
        .is_some_and(|popup| popup.bc_name == bc_name);
    popup
        || state.view.widgets.iter().any(|widget| {
            widget.is_hierarchy() && widget.hierarchy_bcs().contains(&bc_name)
        })
}

/// The same-BC hierarchy widget a fetch of `bc_name` belongs to.
pub fn same_bc_hierarchy<'a>(
    state: &'a AppState,
    bc_name: &str,
    widget_name: Option<&str>,
) -> Option<&'a WidgetMeta> {
    let named = widget_name
        .and_then(|name| state.view.widget(name))
        .filter(|widget| widget.bc_name == bc_name);
    match named {
        Some(widget) => Some(widget).filter(|widget| widget.options.hierarchy_same_bc),
        None => state
            .view
            .widgets
            .iter()
            .find(|widget| widget.bc_name == bc_name && widget.options.hierarchy_same_bc),
    }
}
