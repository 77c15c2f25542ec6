//! Host-side implementations of the crab's tools.

mod shell;

pub use shell::run_command_line;
