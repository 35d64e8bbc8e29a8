use crate::model::{upsert_filter, BcMetaState, DepthBcState};
use crate::store::action::Action;
use crate::store::reducer::Reducer;
use crate::store::state::{AppState, Route, ScreenState};

pub struct ScreenReducer;

impl ScreenReducer {
    /// Points the BCs named in the route's bc path at the route's ids.
    fn apply_route(state: &mut ScreenState, route: &Route) {
        if route.screen != state.screen_name {
            return;
        }
        for (bc_name, id) in route.bc_cursors() {
            if let Some(bc) = state.bo.get_mut(&bc_name) {
                if bc.cursor.as_deref() != Some(id.as_str()) {
                    bc.cursor = Some(id);
                    bc.depth_bc.clear();
                }
            }
        }
    }

    fn with_bc(state: &mut ScreenState, bc_name: &str, f: impl FnOnce(&mut BcMetaState)) {
        if let Some(bc) = state.bo.get_mut(bc_name) {
            f(bc);
        }
    }
}

impl Reducer for ScreenReducer {
    type State = ScreenState;

    fn reduce(mut state: Self::State, action: &Action, root: &AppState) -> Self::State {
        match action {
            Action::SelectScreen { screen } => {
                let mut next = ScreenState {
                    screen_name: screen.name.clone(),
                    views: screen.views.clone(),
                    primary_view: screen.primary.clone(),
                    ..ScreenState::default()
                };
                for meta in &screen.bo.bc {
                    next.bo.insert(meta.name.clone(), BcMetaState::from_meta(meta));
                    if !meta.default_filter.is_empty() {
                        next.filters.insert(meta.name.clone(), meta.default_filter.clone());
                    }
                    if !meta.default_sort.is_empty() {
                        next.sorters.insert(meta.name.clone(), meta.default_sort.clone());
                    }
                }
                next
            }
            Action::SelectView { .. } => {
                // Fetches of the previous view are abandoned and never report back.
                for bc in state.bo.values_mut() {
                    bc.loading = false;
                    for level in bc.depth_bc.values_mut() {
                        level.loading = false;
                    }
                }
                if let Some(route) = root.router.route.as_ref() {
                    Self::apply_route(&mut state, route);
                }
                state
            }
            Action::ChangeLocation { route } => {
                Self::apply_route(&mut state, route);
                state
            }
            Action::Logout => ScreenState::default(),
            Action::BcFetchDataRequest(request) => {
                let level = request.level();
                Self::with_bc(&mut state, &request.bc_name, |bc| {
                    if level > 1 {
                        bc.depth_bc.entry(level).or_default().loading = true;
                    } else {
                        bc.loading = true;
                    }
                });
                state
            }
            Action::BcFetchDataSuccess {
                bc_name,
                has_next,
                depth,
                ..
            } => {
                Self::with_bc(&mut state, bc_name, |bc| match depth {
                    Some(level) if *level > 1 => {
                        bc.depth_bc.entry(*level).or_default().loading = false;
                    }
                    _ => {
                        bc.loading = false;
                        bc.has_next = *has_next;
                    }
                });
                state
            }
            Action::BcFetchDataFail { bc_name, depth, .. } => {
                Self::with_bc(&mut state, bc_name, |bc| match depth {
                    Some(level) if *level > 1 => {
                        bc.depth_bc.entry(*level).or_default().loading = false;
                    }
                    _ => bc.loading = false,
                });
                state
            }
            Action::BcChangeCursors { cursors, .. } => {
                for (bc_name, cursor) in cursors {
                    Self::with_bc(&mut state, bc_name, |bc| {
                        bc.cursor = cursor.clone();
                        bc.depth_bc.clear();
                    });
                }
                state
            }
            Action::BcSelectRecord { bc_name, cursor } => {
                Self::with_bc(&mut state, bc_name, |bc| {
                    bc.cursor = Some(cursor.clone());
                    bc.depth_bc.clear();
                });
                state
            }
            Action::BcChangeDepthCursor {
                bc_name,
                depth,
                cursor,
            } => {
                Self::with_bc(&mut state, bc_name, |bc| {
                    set_depth_cursor(bc, *depth, cursor.clone());
                });
                state
            }
            Action::BcSelectDepthRecord {
                bc_name,
                depth,
                cursor,
                ..
            } => {
                Self::with_bc(&mut state, bc_name, |bc| {
                    set_depth_cursor(bc, *depth, Some(cursor.clone()));
                });
                state
            }
            Action::BcFetchRowMetaSuccess {
                bc_name,
                cursor: Some(cursor),
                ..
            } => {
                Self::with_bc(&mut state, bc_name, |bc| {
                    bc.cursor = Some(cursor.clone());
                });
                state
            }
            Action::BcLoadMore { bc_name, .. } => {
                Self::with_bc(&mut state, bc_name, |bc| bc.page += 1);
                state
            }
            Action::BcChangePage { bc_name, page, .. } => {
                Self::with_bc(&mut state, bc_name, |bc| bc.page = (*page).max(1));
                state
            }
            Action::BcAddFilter {
                bc_name, filter, ..
            } => {
                upsert_filter(state.filters.entry(bc_name.clone()).or_default(), filter.clone());
                Self::with_bc(&mut state, bc_name, |bc| bc.page = 1);
                state
            }
            Action::BcRemoveFilter {
                bc_name, filter, ..
            } => {
                if let Some(filters) = state.filters.get_mut(bc_name) {
                    filters.retain(|existing| !existing.same_slot(filter));
                    if filters.is_empty() {
                        state.filters.remove(bc_name);
                    }
                }
                Self::with_bc(&mut state, bc_name, |bc| bc.page = 1);
                state
            }
            Action::BcRemoveAllFilters { bc_name, .. } => {
                state.filters.remove(bc_name);
                Self::with_bc(&mut state, bc_name, |bc| bc.page = 1);
                state
            }
            Action::BcAddSorter {
                bc_name, sorters, ..
            } => {
                state.sorters.insert(bc_name.clone(), sorters.clone());
                Self::with_bc(&mut state, bc_name, |bc| bc.page = 1);
                state
            }
            _ => state,
        }
    }
}

/// Sets the cursor of `depth` and forgets every deeper level.
fn set_depth_cursor(bc: &mut BcMetaState, depth: usize, cursor: Option<String>) {
    if depth <= 1 {
        bc.cursor = cursor;
        bc.depth_bc.clear();
        return;
    }
    bc.depth_bc.retain(|level, _| *level <= depth);
    bc.depth_bc
        .entry(depth)
        .or_insert_with(DepthBcState::default)
        .cursor = cursor;
}
