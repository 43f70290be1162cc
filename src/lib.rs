//! Tourism data dashboard: upload a CSV, filter it by owner and type, chart
//! the result and download the filtered rows.
//!
//! The `data` module is the whole pipeline and has no UI dependencies;
//! `state` ties it to one session and `ui`/`app` render it with egui.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod state;
pub mod ui;
