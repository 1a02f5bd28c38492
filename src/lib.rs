pub mod article;
pub mod config;
pub mod host;
pub mod images;
pub mod overlay;
pub mod tui;
