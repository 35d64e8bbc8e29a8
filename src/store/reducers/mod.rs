mod data;
mod router;
mod screen;
mod session;
mod view;

pub use data::DataReducer;
pub use router::RouterReducer;
pub use screen::ScreenReducer;
pub use session::SessionReducer;
pub use view::ViewReducer;
