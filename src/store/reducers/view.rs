use std::collections::BTreeSet;

use serde_json::Value;

use crate::model::{association_delta, id_value, MultivalueSingleValue, OperationType, PendingDataItem};
use crate::store::action::Action;
use crate::store::reducer::Reducer;
use crate::store::state::{AppState, Modal, SelectedCell, ViewState};

pub struct ViewReducer;

impl ViewReducer {
    fn delta_mut<'a>(state: &'a mut ViewState, bc_name: &str, cursor: &str) -> &'a mut PendingDataItem {
        state
            .pending
            .entry(bc_name.to_string())
            .or_default()
            .entry(cursor.to_string())
            .or_default()
    }

    fn merge_delta(state: &mut ViewState, bc_name: &str, cursor: &str, delta: &PendingDataItem) {
        let entry = Self::delta_mut(state, bc_name, cursor);
        for (key, value) in delta {
            entry.insert(key.clone(), value.clone());
        }
        for messages in [&mut state.pending_validation_fails, &mut state.field_errors] {
            if let Some(fields) = messages.get_mut(bc_name).and_then(|by_cursor| by_cursor.get_mut(cursor)) {
                fields.retain(|field, _| !delta.contains_key(field));
            }
        }
    }

    fn drop_delta(state: &mut ViewState, bc_name: &str, cursor: &str) {
        if let Some(deltas) = state.pending.get_mut(bc_name) {
            deltas.shift_remove(cursor);
            if deltas.is_empty() {
                state.pending.shift_remove(bc_name);
            }
        }
        for messages in [&mut state.pending_validation_fails, &mut state.field_errors] {
            if let Some(by_cursor) = messages.get_mut(bc_name) {
                by_cursor.remove(cursor);
            }
        }
    }

    fn drop_bc(state: &mut ViewState, bc_name: &str) {
        state.pending.shift_remove(bc_name);
        state.pending_validation_fails.remove(bc_name);
        state.field_errors.remove(bc_name);
    }

    fn associate(state: &mut ViewState, bc_name: &str, id: &str, selected: bool, value: Value) {
        let delta = association_delta(id, selected, value);
        Self::merge_delta(state, bc_name, id, &delta);
    }

    fn is_default_save(state: &ViewState, widget_name: Option<&str>, operation: &OperationType) -> bool {
        widget_name
            .and_then(|name| state.widget(name))
            .and_then(|widget| widget.options.default_save.as_ref())
            == Some(operation)
    }
}

impl Reducer for ViewReducer {
    type State = ViewState;

    fn reduce(mut state: Self::State, action: &Action, root: &AppState) -> Self::State {
        match action {
            Action::SelectScreen { .. } | Action::Logout => ViewState {
                epoch: state.epoch + 1,
                ..ViewState::default()
            },
            Action::SelectView { view } => ViewState {
                name: view.name.clone(),
                url: view.url.clone(),
                widgets: view.widgets.clone(),
                epoch: state.epoch + 1,
                ..ViewState::default()
            },
            Action::BcFetchRowMeta { bc_name, .. } => {
                state.meta_in_progress.insert(bc_name.clone());
                state
            }
            Action::BcFetchRowMetaSuccess {
                bc_name,
                bc_url,
                row_meta,
                ..
            } => {
                state
                    .row_meta
                    .entry(bc_name.clone())
                    .or_default()
                    .insert(bc_url.clone(), row_meta.clone());
                state.meta_in_progress.remove(bc_name);
                state
            }
            Action::BcFetchRowMetaFail { bc_name, .. } => {
                state.meta_in_progress.remove(bc_name);
                state
            }
            Action::BcChangeCursors {
                cursors,
                keep_delta,
            } => {
                if !keep_delta {
                    for bc_name in cursors.keys() {
                        Self::drop_bc(&mut state, bc_name);
                    }
                }
                state
            }
            Action::ChangeDataItem {
                bc_name,
                cursor,
                data_item,
            } => {
                Self::merge_delta(&mut state, bc_name, cursor, data_item);
                state
            }
            Action::ChangeDataItems {
                bc_name,
                cursors,
                data_items,
            } => {
                for (cursor, data_item) in cursors.iter().zip(data_items) {
                    Self::merge_delta(&mut state, bc_name, cursor, data_item);
                }
                state
            }
            Action::BcCancelPendingChanges { bc_names: None } => {
                state.pending.clear();
                state.pending_validation_fails.clear();
                state.field_errors.clear();
                state
            }
            Action::BcCancelPendingChanges {
                bc_names: Some(bc_names),
            } => {
                for bc_name in bc_names {
                    Self::drop_bc(&mut state, bc_name);
                }
                state
            }
            Action::SendOperation {
                bc_name,
                operation_type,
                widget_name,
                ..
            } => {
                if *operation_type == OperationType::Save
                    || Self::is_default_save(&state, widget_name.as_deref(), operation_type)
                {
                    state.saving.insert(bc_name.clone());
                }
                state
            }
            Action::BcSaveDataSuccess {
                bc_name, cursor, ..
            } => {
                state.saving.remove(bc_name);
                Self::drop_delta(&mut state, bc_name, cursor);
                state
            }
            Action::BcSaveDataFail {
                bc_name,
                cursor,
                field_errors,
                ..
            } => {
                state.saving.remove(bc_name);
                if let Some(cursor) = cursor {
                    if !field_errors.is_empty() {
                        state
                            .field_errors
                            .entry(bc_name.clone())
                            .or_default()
                            .insert(cursor.clone(), field_errors.clone());
                    }
                }
                state
            }
            Action::SendOperationSuccess {
                bc_name,
                operation_type,
                cursor,
                ..
            } => {
                state.saving.remove(bc_name);
                if let (OperationType::CancelCreate, Some(cursor)) = (operation_type, cursor) {
                    Self::drop_delta(&mut state, bc_name, cursor);
                }
                state
            }
            Action::SendOperationFail {
                bc_name,
                field_errors,
                ..
            } => {
                state.saving.remove(bc_name);
                if let Some(cursor) = root.screen.cursor(bc_name) {
                    if !field_errors.is_empty() {
                        state
                            .field_errors
                            .entry(bc_name.clone())
                            .or_default()
                            .insert(cursor.to_string(), field_errors.clone());
                    }
                }
                state
            }
            Action::ForceActiveRmUpdate {
                bc_name,
                bc_url,
                cursor,
                current_record,
                row_meta,
            } => {
                state
                    .row_meta
                    .entry(bc_name.clone())
                    .or_default()
                    .insert(bc_url.clone(), row_meta.clone());
                for field in &row_meta.fields {
                    if field.key == "id" || field.key == "vstamp" {
                        continue;
                    }
                    let stored = current_record.get(&field.key).unwrap_or(&Value::Null);
                    let delta = Self::delta_mut(&mut state, bc_name, cursor);
                    if &field.current_value != stored {
                        delta.insert(field.key.clone(), field.current_value.clone());
                    } else {
                        delta.remove(&field.key);
                    }
                }
                state
            }
            Action::ForceActiveChangeFail {
                bc_name,
                cursor,
                field_errors,
                ..
            } => {
                state
                    .field_errors
                    .entry(bc_name.clone())
                    .or_default()
                    .insert(cursor.clone(), field_errors.clone());
                state
            }
            Action::AddPendingValidationFails {
                bc_name,
                cursor,
                fails,
            } => {
                state
                    .pending_validation_fails
                    .entry(bc_name.clone())
                    .or_default()
                    .insert(cursor.clone(), fails.clone());
                state
            }
            Action::ProcessPreInvoke {
                bc_name,
                operation_type,
                widget_name,
                pre_invoke,
                on_success_action,
            } => {
                state.modal = Some(Modal::PreInvoke {
                    bc_name: bc_name.clone(),
                    operation_type: operation_type.clone(),
                    widget_name: widget_name.clone(),
                    pre_invoke: pre_invoke.clone(),
                    on_success_action: on_success_action.clone(),
                });
                state
            }
            Action::OperationConfirmation {
                bc_name,
                operation_type,
                widget_name,
                confirm,
                on_success_action,
            } => {
                state.modal = Some(Modal::Confirm {
                    bc_name: bc_name.clone(),
                    operation_type: operation_type.clone(),
                    widget_name: widget_name.clone(),
                    confirm: confirm.clone(),
                    on_success_action: on_success_action.clone(),
                });
                state
            }
            Action::ResolveConfirmation { .. } => {
                state.modal = None;
                state
            }
            Action::ShowViewPopup { popup } => {
                state.popup = Some(popup.clone());
                state
            }
            Action::CloseViewPopup => {
                state.popup = None;
                state
            }
            Action::ChangeAssociation {
                bc_name,
                record,
                associate,
                assoc_value_key,
                ..
            }
            | Action::ChangeAssociationSameBc {
                bc_name,
                record,
                associate,
                assoc_value_key,
                ..
            } => {
                let value = record.get(assoc_value_key).cloned().unwrap_or(Value::Null);
                Self::associate(&mut state, bc_name, &record.id, *associate, value);
                state
            }
            Action::ChangeChildrenAssociations {
                bc_name,
                assoc_value_key,
                selected,
            } => {
                for record in root.data.records(bc_name) {
                    let value = record.get(assoc_value_key).cloned().unwrap_or(Value::Null);
                    Self::associate(&mut state, bc_name, &record.id, *selected, value);
                }
                state
            }
            Action::ChangeChildrenAssociationsSameBc {
                bc_name,
                depth,
                parent_id,
                parent_key,
                assoc_value_key,
                selected,
            } => {
                let mut parents: BTreeSet<String> = BTreeSet::from([parent_id.clone()]);
                let mut level = (*depth).max(1) + 1;
                loop {
                    let children: Vec<_> = root
                        .data
                        .records_at(bc_name, level)
                        .iter()
                        .filter(|record| {
                            record
                                .get(parent_key)
                                .and_then(id_value)
                                .is_some_and(|parent| parents.contains(&parent))
                        })
                        .collect();
                    if children.is_empty() {
                        break;
                    }
                    for record in &children {
                        let value = record.get(assoc_value_key).cloned().unwrap_or(Value::Null);
                        Self::associate(&mut state, bc_name, &record.id, *selected, value);
                    }
                    parents = children.iter().map(|record| record.id.clone()).collect();
                    level += 1;
                }
                state
            }
            Action::RemoveMultivalueTag {
                bc_name,
                popup_bc_name,
                cursor,
                associate_field_key,
                data_item,
                removed_item,
            } => {
                let mut field = PendingDataItem::new();
                field.insert(
                    associate_field_key.clone(),
                    MultivalueSingleValue::list_to_value(data_item),
                );
                Self::merge_delta(&mut state, bc_name, cursor, &field);
                Self::associate(
                    &mut state,
                    popup_bc_name,
                    &removed_item.id,
                    false,
                    removed_item.value.clone(),
                );
                state
            }
            Action::SelectTableCellInit {
                widget_name,
                row_id,
                field_key,
            } => {
                state.selected_cell = Some(SelectedCell {
                    widget_name: widget_name.clone(),
                    row_id: row_id.clone(),
                    field_key: field_key.clone(),
                });
                state
            }
            Action::ShowViewError { error } => {
                state.error = Some(error.clone());
                state
            }
            Action::CloseViewError => {
                state.error = None;
                state
            }
            _ => state,
        }
    }
}
