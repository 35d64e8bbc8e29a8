//! State tree, actions, reducers and the dispatch bus.

mod action;
mod bus;
mod cancel;
mod reducer;
mod reducers;
pub mod selectors;
mod state;

pub use action::{Action, FetchRequest, FieldErrors};
pub use bus::{Services, Store};
pub use cancel::{CancelRegistry, RequestKind, RequestTicket};
pub use reducer::{root_reduce, Reducer};
pub use reducers::{DataReducer, RouterReducer, ScreenReducer, SessionReducer, ViewReducer};
pub use state::{
    AppState, DataState, Modal, Notification, Route, RouterState, ScreenState, SelectedCell,
    SessionState, SliceState, ViewError, ViewErrorKind, ViewState,
};
