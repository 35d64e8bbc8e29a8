use crate::store::action::Action;
use crate::store::reducer::Reducer;
use crate::store::state::{AppState, SessionState};

pub struct SessionReducer;

impl Reducer for SessionReducer {
    type State = SessionState;

    fn reduce(mut state: Self::State, action: &Action, _root: &AppState) -> Self::State {
        match action {
            Action::Logout => SessionState {
                active: false,
                notifications: Vec::new(),
            },
            Action::ShowNotification { notification } => {
                state.notifications.push(notification.clone());
                state
            }
            Action::CloseNotification { id } => {
                state.notifications.retain(|notification| &notification.id != id);
                state
            }
            _ => state,
        }
    }
}
