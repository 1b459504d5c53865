pub mod config;
pub mod core;
pub mod render;
pub mod tui;
