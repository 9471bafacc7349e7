// Library surface for headless/integration tests and reuse.
// The binary only parses arguments, wires adapters and runs the loop.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod errors;
pub mod form;
pub mod identity;
pub mod keymap;
pub mod map;
pub mod persistence;
pub mod runtime;
pub mod storage;
pub mod ui;
pub mod workout;
