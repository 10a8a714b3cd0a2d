pub mod app;
pub mod command;
pub mod context;
pub mod detail_window;
pub mod month_pane;
pub mod plain;
mod util;

pub use app::App;
pub use context::{Context, DetailState, Mode, Theme};
pub use detail_window::DetailWindow;
pub use month_pane::MonthPane;
