pub mod dashboard;
pub mod grid;
pub mod layout;
pub mod widgets;

pub use dashboard::{Dashboard, DashboardContext, DashboardEvent};
pub use layout::{LayoutItem, LayoutManager, WidgetInstance};
pub use widgets::{Widget, WidgetRegistry};
