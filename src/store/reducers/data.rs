use crate::model::OperationType;
use crate::store::action::Action;
use crate::store::reducer::Reducer;
use crate::store::state::{AppState, DataState};

pub struct DataReducer;

impl Reducer for DataReducer {
    type State = DataState;

    fn reduce(mut state: Self::State, action: &Action, _root: &AppState) -> Self::State {
        match action {
            Action::SelectScreen { .. } | Action::Logout => DataState::default(),
            Action::BcFetchDataSuccess {
                bc_name,
                data,
                depth,
                append,
                ..
            } => {
                match depth {
                    Some(level) if *level > 1 => {
                        state
                            .depth_records
                            .entry(*level)
                            .or_default()
                            .insert(bc_name.clone(), data.clone());
                    }
                    _ if *append => {
                        let records = state.records.entry(bc_name.clone()).or_default();
                        for item in data {
                            match records.iter_mut().find(|existing| existing.id == item.id) {
                                Some(existing) => *existing = item.clone(),
                                None => records.push(item.clone()),
                            }
                        }
                    }
                    _ => {
                        state.records.insert(bc_name.clone(), data.clone());
                    }
                }
                state
            }
            Action::BcNewDataSuccess {
                bc_name, data_item, ..
            } => {
                state
                    .records
                    .entry(bc_name.clone())
                    .or_default()
                    .push(data_item.clone());
                state
            }
            Action::BcSaveDataSuccess {
                bc_name,
                data_item: Some(data_item),
                ..
            } => {
                let records = state.records.entry(bc_name.clone()).or_default();
                match records.iter_mut().find(|record| record.id == data_item.id) {
                    Some(record) => *record = data_item.clone(),
                    None => records.push(data_item.clone()),
                }
                state
            }
            Action::SendOperationSuccess {
                bc_name,
                operation_type: OperationType::CancelCreate,
                cursor: Some(cursor),
                ..
            } => {
                if let Some(records) = state.records.get_mut(bc_name) {
                    records.retain(|record| &record.id != cursor);
                }
                state
            }
            _ => state,
        }
    }
}
