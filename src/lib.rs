// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod cue;
pub mod metrics;
pub mod recipe;
pub mod runtime;
pub mod store;
pub mod timer;
