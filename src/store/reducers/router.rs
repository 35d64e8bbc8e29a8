use crate::store::action::Action;
use crate::store::reducer::Reducer;
use crate::store::state::{AppState, RouterState};

pub struct RouterReducer;

impl Reducer for RouterReducer {
    type State = RouterState;

    fn reduce(mut state: Self::State, action: &Action, _root: &AppState) -> Self::State {
        match action {
            Action::ChangeLocation { route } => {
                state.route = Some(route.clone());
                state
            }
            Action::SelectView { view } => {
                if let Some(route) = state.route.as_mut() {
                    route.view = Some(view.name.clone());
                }
                state
            }
            Action::Logout => RouterState::default(),
            _ => state,
        }
    }
}
