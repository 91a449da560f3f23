pub(crate) mod app;
pub(crate) mod state;
pub(crate) mod views;
pub(crate) mod widgets;

pub use app::WatchArgs;
