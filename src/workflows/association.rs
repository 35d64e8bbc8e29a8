//! Association popups.
//!
//! A passive popup edits the callee's multivalue field locally; an active one
//! commits its selection through the `associate` endpoint.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use super::post_invoke::dispatch_post_actions;
use super::{errors, Workflow, WorkflowContext};
use crate::model::{
    association_delta, delta_associate, is_association_delta, MultivalueSingleValue, OperationType,
    PendingDataItem, PopupData, ASSOCIATE_VALUE_KEY,
};
use crate::store::selectors::{build_bc_url, effective_record};
use crate::store::{Action, AppState, FetchRequest};

/// Field read for an association's display value when none is configured.
pub(crate) const DEFAULT_ASSOC_VALUE_KEY: &str = "name";

/// Current multivalue of the field the popup edits.
fn callee_value(state: &AppState, popup: &PopupData) -> Vec<MultivalueSingleValue> {
    let (Some(callee), Some(field_key)) = (&popup.callee_bc_name, &popup.associate_field_key) else {
        return Vec::new();
    };
    state
        .screen
        .cursor(callee)
        .and_then(|cursor| effective_record(state, callee, cursor))
        .map(|record| MultivalueSingleValue::list_from(record.get(field_key)))
        .unwrap_or_default()
}

/// Association deltas of `bc_name`, in edit order.
fn association_deltas<'a>(state: &'a AppState, bc_name: &str) -> Vec<(&'a String, &'a PendingDataItem)> {
    state
        .view
        .pending
        .get(bc_name)
        .map(|deltas| {
            deltas
                .iter()
                .filter(|(_, delta)| is_association_delta(delta))
                .collect()
        })
        .unwrap_or_default()
}

/// Multivalue after applying the popup's pending selection to `previous`.
pub(crate) fn merge_selection(
    previous: &[MultivalueSingleValue],
    deltas: &[(&String, &PendingDataItem)],
) -> Vec<MultivalueSingleValue> {
    let mut merged: IndexMap<String, MultivalueSingleValue> = previous
        .iter()
        .map(|item| (item.id.clone(), item.clone()))
        .collect();
    for (id, delta) in deltas {
        match delta_associate(delta) {
            Some(true) => {
                if !merged.contains_key(id.as_str()) {
                    let value = delta.get(ASSOCIATE_VALUE_KEY).cloned().unwrap_or(Value::Null);
                    merged.insert((*id).clone(), MultivalueSingleValue::new((*id).clone(), value));
                }
            }
            Some(false) => {
                merged.shift_remove(id.as_str());
            }
            None => {}
        }
    }
    merged.into_values().collect()
}

/// Opens a popup: seeds a passive popup's selection and loads its BC.
pub struct ShowPopupWorkflow;

#[async_trait]
impl Workflow for ShowPopupWorkflow {
    fn name(&self) -> &'static str {
        "show_popup"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::ShowViewPopup { .. })
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::ShowViewPopup { popup } = action else {
            return;
        };
        if !popup.active {
            let selected = callee_value(ctx.state(), &popup);
            if !selected.is_empty() {
                let cursors = selected.iter().map(|item| item.id.clone()).collect();
                let data_items = selected
                    .iter()
                    .map(|item| association_delta(&item.id, true, item.value.clone()))
                    .collect();
                ctx.dispatch(Action::ChangeDataItems {
                    bc_name: popup.bc_name.clone(),
                    cursors,
                    data_items,
                });
            }
        }
        ctx.dispatch(Action::BcFetchDataRequest(
            FetchRequest::new(popup.bc_name)
                .widget(popup.widget_name)
                .keep_delta(),
        ));
    }
}

/// Marks server-flagged rows of a passive popup as selected when nothing
/// else defines the selection yet.
pub struct PopupSeedWorkflow;

#[async_trait]
impl Workflow for PopupSeedWorkflow {
    fn name(&self) -> &'static str {
        "popup_seed"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::BcFetchDataSuccess { depth: None, .. })
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::BcFetchDataSuccess { bc_name, data, .. } = action else {
            return;
        };
        let state = ctx.state();
        let Some(popup) = state.view.popup.as_ref() else {
            return;
        };
        if popup.active || popup.bc_name != bc_name {
            return;
        }
        if !callee_value(state, popup).is_empty() || state.view.pending.contains_key(&bc_name) {
            return;
        }
        let assoc_value_key = popup
            .assoc_value_key
            .as_deref()
            .unwrap_or(DEFAULT_ASSOC_VALUE_KEY);
        let flagged: Vec<_> = data
            .iter()
            .filter(|record| record.associated() == Some(true))
            .collect();
        if flagged.is_empty() {
            return;
        }
        ctx.dispatch(Action::ChangeDataItems {
            bc_name,
            cursors: flagged.iter().map(|record| record.id.clone()).collect(),
            data_items: flagged
                .iter()
                .map(|record| {
                    let value = record.get(assoc_value_key).cloned().unwrap_or(Value::Null);
                    association_delta(&record.id, true, value)
                })
                .collect(),
        });
    }
}

/// Confirms a popup's selection.
pub struct SaveAssociationsWorkflow;

impl SaveAssociationsWorkflow {
    fn save_passive(ctx: &WorkflowContext, popup: &PopupData, bc_names: Vec<String>) {
        let state = ctx.state();
        let (Some(callee), Some(field_key)) = (&popup.callee_bc_name, &popup.associate_field_key) else {
            debug!(bc_name = %popup.bc_name, "Passive popup without a callee field");
            return;
        };
        let Some(cursor) = state.screen.cursor(callee) else {
            return;
        };
        let deltas: Vec<_> = bc_names
            .iter()
            .flat_map(|bc_name| association_deltas(state, bc_name))
            .collect();
        let merged = merge_selection(&callee_value(state, popup), &deltas);

        let mut data_item = PendingDataItem::new();
        data_item.insert(field_key.clone(), MultivalueSingleValue::list_to_value(&merged));
        ctx.dispatch(Action::ChangeDataItem {
            bc_name: callee.clone(),
            cursor: cursor.to_string(),
            data_item,
        });
        ctx.dispatch(Action::BcCancelPendingChanges {
            bc_names: Some(bc_names),
        });
        ctx.dispatch(Action::CloseViewPopup);
    }

    async fn save_active(ctx: &WorkflowContext, popup: &PopupData, bc_names: Vec<String>) {
        let state = ctx.state();
        let items = |bc_name: &str| -> Value {
            association_deltas(state, bc_name)
                .into_iter()
                .filter(|(_, delta)| delta_associate(delta) == Some(true))
                .map(|(id, delta)| match state.data.record(bc_name, id) {
                    Some(record) => Value::Object(record.merged(Some(delta)).to_object()),
                    None => Value::Object(delta.clone()),
                })
                .collect()
        };
        let body = match bc_names.as_slice() {
            [single] => items(single),
            several => Value::Object(
                several
                    .iter()
                    .map(|bc_name| (build_bc_url(state, bc_name, false), items(bc_name)))
                    .collect::<Map<String, Value>>(),
            ),
        };
        let bc_url = build_bc_url(state, &popup.bc_name, false);

        info!(bc_name = %popup.bc_name, bc_url = %bc_url, "Saving associations");
        match ctx.api().associate(ctx.screen_name(), &bc_url, &body).await {
            Ok(response) => {
                dispatch_post_actions(
                    ctx,
                    &popup.bc_name,
                    popup.widget_name.as_deref(),
                    &OperationType::Associate,
                    response.post_actions,
                    None,
                );
                ctx.dispatch(Action::BcCancelPendingChanges {
                    bc_names: Some(bc_names),
                });
                if let Some(callee) = &popup.callee_bc_name {
                    let widget_name = state.view.widget_of(callee).map(|widget| widget.name.clone());
                    ctx.dispatch(Action::force_update(callee, widget_name));
                }
                ctx.dispatch(Action::CloseViewPopup);
            }
            Err(err) => {
                error!(bc_name = %popup.bc_name, bc_url = %bc_url, kind = err.kind(), error = %err, "Associate failed");
                ctx.dispatch(Action::BcSaveDataFail {
                    bc_name: popup.bc_name.clone(),
                    bc_url,
                    cursor: None,
                    field_errors: err.field_errors(),
                });
                errors::report(ctx, &err);
            }
        }
    }
}

#[async_trait]
impl Workflow for SaveAssociationsWorkflow {
    fn name(&self) -> &'static str {
        "save_associations"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::SaveAssociations { .. })
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::SaveAssociations { bc_names } = action else {
            return;
        };
        let Some(popup) = ctx.state().view.popup.clone() else {
            debug!("No popup open, nothing to associate");
            return;
        };
        let bc_names = if bc_names.is_empty() {
            vec![popup.bc_name.clone()]
        } else {
            bc_names
        };
        if popup.active {
            Self::save_active(&ctx, &popup, bc_names).await;
        } else {
            Self::save_passive(&ctx, &popup, bc_names);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selection_adds_new_and_drops_deselected_items() {
        let previous = vec![
            MultivalueSingleValue::new("1", json!("One")),
            MultivalueSingleValue::new("2", json!("Two")),
        ];
        let (one, three) = ("1".to_string(), "3".to_string());
        let deselect = association_delta("1", false, json!("One"));
        let select = association_delta("3", true, json!("Three"));
        let deltas = vec![(&one, &deselect), (&three, &select)];

        let merged = merge_selection(&previous, &deltas);
        let ids: Vec<&str> = merged.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
        assert_eq!(merged[1].value, json!("Three"));
    }

    #[test]
    fn reselecting_a_present_item_keeps_its_value() {
        let previous = vec![MultivalueSingleValue::new("1", json!("Original"))];
        let one = "1".to_string();
        let select = association_delta("1", true, json!("Changed"));
        let merged = merge_selection(&previous, &[(&one, &select)]);
        assert_eq!(merged, previous);
    }
}
