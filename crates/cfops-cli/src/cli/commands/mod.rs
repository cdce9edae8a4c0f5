//! CLI command handlers. Each command is in its own file.

mod show_config;
mod simulate;

pub use show_config::run_show_config;
pub use simulate::{run_simulate, FailureMode, SimulateOptions};
