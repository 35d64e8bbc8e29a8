//! Reducer trait and the root reducer.

use super::action::Action;
use super::reducers::{DataReducer, RouterReducer, ScreenReducer, SessionReducer, ViewReducer};
use super::state::{AppState, SliceState};

/// Reducer transforms one slice based on actions.
///
/// The reducer is the only place where state transitions happen.
/// It must be a pure function: (State, Action, previous tree) -> State
pub trait Reducer {
    /// The slice this reducer operates on.
    type State: SliceState;

    /// Process an action and return the new slice.
    ///
    /// `root` is the whole tree as it was before the action; other slices are
    /// read from it, never written.
    fn reduce(state: Self::State, action: &Action, root: &AppState) -> Self::State;
}

/// Applies `action` to every slice of `prev`.
pub fn root_reduce(prev: &AppState, action: &Action) -> AppState {
    AppState {
        screen: ScreenReducer::reduce(prev.screen.clone(), action, prev),
        data: DataReducer::reduce(prev.data.clone(), action, prev),
        view: ViewReducer::reduce(prev.view.clone(), action, prev),
        session: SessionReducer::reduce(prev.session.clone(), action, prev),
        router: RouterReducer::reduce(prev.router.clone(), action, prev),
    }
}
