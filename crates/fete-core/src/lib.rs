pub mod card;
pub mod catalog;
pub mod config;
pub mod disclosure;
pub mod format;
pub mod node;
pub mod paths;
pub mod prompt;
pub mod response;
pub mod save;
pub mod section;
pub mod selection;
pub mod session;
pub mod shape;
