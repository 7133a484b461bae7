//! Schema command implementation.
//!
//! `checkup schema` prints the JSON schema of `checkup.yml` so editors can
//! validate manifests.

use crate::config::manifest_schema;
use crate::error::{CheckupError, Result};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Render the manifest schema as pretty-printed JSON.
pub fn render_schema() -> Result<String> {
    serde_json::to_string_pretty(&manifest_schema()).map_err(|e| CheckupError::Other(e.into()))
}

/// The schema command implementation.
pub struct SchemaCommand;

impl Command for SchemaCommand {
    fn execute(&self, _ui: &mut dyn UserInterface) -> Result<CommandResult> {
        println!("{}", render_schema()?);
        Ok(CommandResult::success())
    }
}
