#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod forms;
pub mod keymap;
pub mod logging;
pub mod notify;
pub mod player;
pub mod render;
pub mod state;
pub mod ui;
pub mod vlogs;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::{print_feed, run};
