pub mod dashboard;
pub mod gui;
pub mod logging;
pub mod settings;
pub mod store;
pub mod theme;
pub mod transfer;
pub mod weather;
