//! External command execution for leaf checks and remediations.

pub mod command;
pub mod platform;

pub use command::{execute, execute_check, CommandOptions, CommandResult};
pub use platform::{is_ci, is_elevated};
