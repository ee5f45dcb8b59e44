pub mod ai;
pub mod config_store;
pub mod plans;
pub mod save;
pub mod store;
pub mod text;
pub mod tui;
