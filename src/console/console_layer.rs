// Console layer - the operator command line over the core services.

#[path = "commands.rs"]
pub mod commands;

#[path = "formatter.rs"]
pub mod formatter;

pub use commands::{execute, Cli, CommandError, Data};
pub use formatter::render;
