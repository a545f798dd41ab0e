// The binary entry point is main.rs; the module tree lives here so that the
// integration tests under tests/ can drive the session controller directly.

pub mod app;
pub mod catalog;
pub mod config;
pub mod event;
pub mod generator;
pub mod session;
pub mod store;
pub mod ui;
