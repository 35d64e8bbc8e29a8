//! Selection propagation inside hierarchy widgets.
//!
//! Cross-BC hierarchies keep one BC per level; same-BC hierarchies keep every
//! level in one BC linked by a parent-key field. The cross-BC sibling scan
//! walks the loaded rows and looks their deltas up; the same-BC scan filters
//! the level by parent and consults the deltas first.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use super::association::DEFAULT_ASSOC_VALUE_KEY;
use super::{Workflow, WorkflowContext};
use crate::model::{association_delta, delta_associate, id_value, DataItem, PendingDataItem, WidgetMeta};
use crate::store::selectors::is_selected;
use crate::store::{Action, AppState};

/// Pending deltas of one BC, keyed by record id.
pub type Deltas = IndexMap<String, PendingDataItem>;

/// Whether a row other than `except` is selected, scanning loaded rows.
pub fn has_selected_sibling_cross(records: &[DataItem], deltas: Option<&Deltas>, except: &str) -> bool {
    records
        .iter()
        .filter(|record| record.id != except)
        .any(|record| is_selected(record, deltas.and_then(|deltas| deltas.get(&record.id))))
}

/// Whether a child of `parent_id` other than `except` is selected.
pub fn has_selected_sibling_same_bc(
    records: &[DataItem],
    deltas: Option<&Deltas>,
    parent_key: &str,
    parent_id: &str,
    except: &str,
) -> bool {
    let siblings: Vec<&DataItem> = records
        .iter()
        .filter(|record| record.id != except)
        .filter(|record| record.get(parent_key).and_then(id_value).as_deref() == Some(parent_id))
        .collect();
    let delta_selected = deltas.is_some_and(|deltas| {
        deltas.iter().any(|(id, delta)| {
            delta_associate(delta) == Some(true) && siblings.iter().any(|sibling| &sibling.id == id)
        })
    });
    delta_selected
        || siblings.iter().any(|sibling| {
            deltas.and_then(|deltas| deltas.get(&sibling.id)).is_none()
                && sibling.associated() == Some(true)
        })
}

fn associate_action(bc_name: &str, record: &DataItem, selected: bool, assoc_value_key: &str) -> Action {
    let value = record.get(assoc_value_key).cloned().unwrap_or(Value::Null);
    Action::ChangeDataItem {
        bc_name: bc_name.to_string(),
        cursor: record.id.clone(),
        data_item: association_delta(&record.id, selected, value),
    }
}

fn level_radio(widget: &WidgetMeta, level: usize) -> bool {
    match level {
        0 => widget.options.hierarchy_radio,
        _ => widget
            .options
            .hierarchy
            .get(level - 1)
            .is_some_and(|level| level.radio),
    }
}

fn level_value_key(widget: &WidgetMeta, level: usize) -> String {
    let configured = match level {
        0 => widget
            .fields
            .iter()
            .find_map(|field| field.assoc_value_key.clone()),
        _ => widget
            .options
            .hierarchy
            .get(level - 1)
            .and_then(|level| level.assoc_value_key.clone()),
    };
    configured.unwrap_or_else(|| DEFAULT_ASSOC_VALUE_KEY.to_string())
}

/// Follow-ups of toggling `record` in a cross-BC hierarchy.
///
/// `state` must already contain the record's own association delta.
pub fn plan_change_association(
    state: &AppState,
    widget: &WidgetMeta,
    bc_name: &str,
    record: &DataItem,
    associate: bool,
    assoc_value_key: &str,
) -> Vec<Action> {
    let levels = widget.hierarchy_bcs();
    let Some(level) = levels.iter().position(|bc| *bc == bc_name) else {
        return Vec::new();
    };
    let options = &widget.options;
    let radio = level_radio(widget, level);
    let mut plan = Vec::new();

    if associate && radio {
        let deltas = state.view.pending.get(bc_name);
        for sibling in state.data.records(bc_name) {
            if sibling.id != record.id
                && is_selected(sibling, deltas.and_then(|deltas| deltas.get(&sibling.id)))
            {
                plan.push(associate_action(bc_name, sibling, false, assoc_value_key));
            }
        }
    }

    let cascade_down = options.hierarchy_group_selection || (!associate && radio);
    // Loaded child rows belong to the parent cursor only.
    if cascade_down && state.screen.cursor(bc_name) == Some(record.id.as_str()) {
        for (child_level, child) in levels.iter().enumerate().skip(level + 1) {
            plan.push(Action::ChangeChildrenAssociations {
                bc_name: child.to_string(),
                assoc_value_key: level_value_key(widget, child_level),
                selected: associate,
            });
        }
    }

    if options.hierarchy_traverse {
        let mut child_level = level;
        let mut child_id = record.id.clone();
        while child_level > 0 {
            let parent_bc = levels[child_level - 1];
            let Some(parent) = state
                .screen
                .cursor(parent_bc)
                .and_then(|cursor| state.data.record(parent_bc, cursor))
            else {
                break;
            };
            let parent_deltas = state.view.pending.get(parent_bc);
            let parent_selected = is_selected(parent, parent_deltas.and_then(|deltas| deltas.get(&parent.id)));
            let child_bc = levels[child_level];
            let propagate = if associate {
                !parent_selected
            } else {
                parent_selected
                    && !has_selected_sibling_cross(
                        state.data.records(child_bc),
                        state.view.pending.get(child_bc),
                        &child_id,
                    )
            };
            if !propagate {
                break;
            }
            plan.push(associate_action(
                parent_bc,
                parent,
                associate,
                &level_value_key(widget, child_level - 1),
            ));
            child_level -= 1;
            child_id = parent.id.clone();
        }
    }
    plan
}

/// Follow-ups of toggling `record` at `depth` of a same-BC hierarchy.
///
/// `state` must already contain the record's own association delta.
pub fn plan_change_association_same_bc(
    state: &AppState,
    widget: &WidgetMeta,
    depth: usize,
    record: &DataItem,
    associate: bool,
    assoc_value_key: &str,
) -> Vec<Action> {
    let bc_name = widget.bc_name.as_str();
    let parent_key = widget.parent_key();
    let options = &widget.options;
    let deltas = state.view.pending.get(bc_name);
    let depth = depth.max(1);
    let parent_of = |item: &DataItem| item.get(parent_key).and_then(id_value);
    let mut plan = Vec::new();

    if associate && options.hierarchy_radio {
        let parent = parent_of(record);
        for sibling in state.data.records_at(bc_name, depth) {
            if sibling.id != record.id
                && parent_of(sibling) == parent
                && is_selected(sibling, deltas.and_then(|deltas| deltas.get(&sibling.id)))
            {
                plan.push(associate_action(bc_name, sibling, false, assoc_value_key));
            }
        }
    }

    if options.hierarchy_group_selection || (!associate && options.hierarchy_radio) {
        plan.push(Action::ChangeChildrenAssociationsSameBc {
            bc_name: bc_name.to_string(),
            depth,
            parent_id: record.id.clone(),
            parent_key: parent_key.to_string(),
            assoc_value_key: assoc_value_key.to_string(),
            selected: associate,
        });
    }

    if options.hierarchy_traverse {
        let mut level = depth;
        let mut current = record.clone();
        while level > 1 {
            let Some(parent_id) = parent_of(&current) else {
                break;
            };
            let Some(parent) = state
                .data
                .records_at(bc_name, level - 1)
                .iter()
                .find(|item| item.id == parent_id)
            else {
                break;
            };
            let parent_selected = is_selected(parent, deltas.and_then(|deltas| deltas.get(&parent.id)));
            let propagate = if associate {
                !parent_selected
            } else {
                parent_selected
                    && !has_selected_sibling_same_bc(
                        state.data.records_at(bc_name, level),
                        deltas,
                        parent_key,
                        &parent_id,
                        &current.id,
                    )
            };
            if !propagate {
                break;
            }
            plan.push(associate_action(bc_name, parent, associate, assoc_value_key));
            level -= 1;
            current = parent.clone();
        }
    }
    plan
}

/// Propagates `ChangeAssociation` through a cross-BC hierarchy widget.
pub struct ChangeAssociationWorkflow;

#[async_trait]
impl Workflow for ChangeAssociationWorkflow {
    fn name(&self) -> &'static str {
        "change_association"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::ChangeAssociation { .. })
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::ChangeAssociation {
            bc_name,
            widget_name,
            record,
            associate,
            assoc_value_key,
        } = action
        else {
            return;
        };
        let state = ctx.state();
        let Some(widget) = state.view.widget(&widget_name) else {
            return;
        };
        for follow_up in plan_change_association(state, widget, &bc_name, &record, associate, &assoc_value_key) {
            ctx.dispatch(follow_up);
        }
    }
}

/// Propagates `ChangeAssociationSameBc` through a same-BC hierarchy widget.
pub struct ChangeAssociationSameBcWorkflow;

#[async_trait]
impl Workflow for ChangeAssociationSameBcWorkflow {
    fn name(&self) -> &'static str {
        "change_association_same_bc"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::ChangeAssociationSameBc { .. })
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::ChangeAssociationSameBc {
            widget_name,
            depth,
            record,
            associate,
            assoc_value_key,
            ..
        } = action
        else {
            return;
        };
        let state = ctx.state();
        let Some(widget) = state.view.widget(&widget_name) else {
            return;
        };
        let plan = plan_change_association_same_bc(state, widget, depth, &record, associate, &assoc_value_key);
        for follow_up in plan {
            ctx.dispatch(follow_up);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BcMeta, BcMetaState, HierarchyLevel};
    use crate::store::root_reduce;
    use serde_json::json;

    fn cross_state() -> (AppState, WidgetMeta) {
        let mut widget = WidgetMeta::new("tree", "AssocListPopup", "region");
        widget.options.hierarchy = vec![HierarchyLevel {
            bc_name: "city".into(),
            ..HierarchyLevel::default()
        }];
        widget.options.hierarchy_traverse = true;

        let mut state = AppState::default();
        for meta in [
            BcMeta::new("region", None, "region"),
            BcMeta::new("city", Some("region"), "region/:id/city"),
        ] {
            let mut bc = BcMetaState::from_meta(&meta);
            bc.cursor = Some(if meta.name == "region" { "r1" } else { "c1" }.into());
            state.screen.bo.insert(meta.name.clone(), bc);
        }
        state.data.records.insert(
            "region".into(),
            vec![DataItem::new("r1", 0).with_field("name", json!("North"))],
        );
        state.data.records.insert(
            "city".into(),
            vec![
                DataItem::new("c1", 0).with_field("name", json!("A")),
                DataItem::new("c2", 0).with_field("name", json!("B")),
            ],
        );
        state.view.widgets = vec![widget.clone()];
        (state, widget)
    }

    fn toggle(state: AppState, widget: &WidgetMeta, bc: &str, id: &str, associate: bool) -> AppState {
        let record = state.data.record(bc, id).cloned().unwrap();
        let action = Action::ChangeAssociation {
            bc_name: bc.into(),
            widget_name: widget.name.clone(),
            record: record.clone(),
            associate,
            assoc_value_key: "name".into(),
        };
        let state = root_reduce(&state, &action);
        let plan = plan_change_association(&state, widget, bc, &record, associate, "name");
        plan.iter().fold(state, |state, action| root_reduce(&state, action))
    }

    fn selected(state: &AppState, bc: &str, id: &str) -> bool {
        let record = state.data.record(bc, id).unwrap();
        is_selected(record, state.view.delta(bc, id))
    }

    #[test]
    fn selecting_a_child_selects_the_parent() {
        let (state, widget) = cross_state();
        let state = toggle(state, &widget, "city", "c1", true);
        assert!(selected(&state, "region", "r1"));
    }

    #[test]
    fn parent_stays_selected_while_a_sibling_is() {
        let (state, widget) = cross_state();
        let state = toggle(state, &widget, "city", "c1", true);
        let state = toggle(state, &widget, "city", "c2", true);
        let state = toggle(state, &widget, "city", "c1", false);
        assert!(selected(&state, "region", "r1"));
        let state = toggle(state, &widget, "city", "c2", false);
        assert!(!selected(&state, "region", "r1"));
    }

    #[test]
    fn radio_level_deselects_siblings() {
        let (state, mut widget) = cross_state();
        widget.options.hierarchy[0].radio = true;
        let state = toggle(state, &widget, "city", "c1", true);
        let state = toggle(state, &widget, "city", "c2", true);
        assert!(!selected(&state, "city", "c1"));
        assert!(selected(&state, "city", "c2"));
    }

    #[test]
    fn group_selection_selects_loaded_children() {
        let (state, mut widget) = cross_state();
        widget.options.hierarchy_group_selection = true;
        let state = toggle(state, &widget, "region", "r1", true);
        assert!(selected(&state, "city", "c1"));
        assert!(selected(&state, "city", "c2"));
        let state = toggle(state, &widget, "region", "r1", false);
        assert!(!selected(&state, "city", "c1"));
    }

    #[test]
    fn same_bc_scan_only_counts_children_of_the_parent() {
        let records = vec![
            DataItem::new("a", 0).with_field("parentId", json!("p1")),
            DataItem::new("b", 0)
                .with_field("parentId", json!("p2"))
                .with_field("_associate", json!(true)),
        ];
        assert!(!has_selected_sibling_same_bc(&records, None, "parentId", "p1", "x"));
        assert!(has_selected_sibling_cross(&records, None, "x"));

        let mut deltas = Deltas::new();
        deltas.insert("a".into(), association_delta("a", true, json!(null)));
        assert!(has_selected_sibling_same_bc(&records, Some(&deltas), "parentId", "p1", "x"));
    }
}
