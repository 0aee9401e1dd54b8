//! Tuneup library - exposes modules for the binary and integration tests

pub mod banner;
pub mod cli;
pub mod credential;
pub mod errors;
pub mod exec;
pub mod history;
pub mod logging;
pub mod menu;
pub mod pipeline;
pub mod progress;
pub mod tunables;
pub mod tweaks;
pub mod update;
