//! Check command implementation.
//!
//! The `checkup check` command loads the manifest, orders its checks and
//! runs them, offering fixes for the ones that fail.

use std::path::{Path, PathBuf};

use crate::checks::build_registry;
use crate::checkup::Platform;
use crate::cli::args::CheckArgs;
use crate::config::{load_manifest, DEFAULT_MANIFEST};
use crate::error::{CheckupError, Result};
use crate::runner::{CheckupGraph, CheckupRunner, FixMode, RunOptions};
use crate::shell::is_ci;
use crate::state::SharedState;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The check command implementation.
pub struct CheckCommand {
    working_dir: PathBuf,
    manifest: Option<String>,
    args: CheckArgs,
}

impl CheckCommand {
    /// Create a new check command.
    pub fn new(working_dir: &Path, manifest: Option<&str>, args: CheckArgs) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            manifest: manifest.map(String::from),
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &CheckArgs {
        &self.args
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let manifest = match load_manifest(self.manifest.as_deref(), &self.working_dir) {
            Ok(m) => m,
            Err(CheckupError::ManifestNotFound { path }) => {
                ui.error(&format!(
                    "No manifest found at {}. Create {} or pass --manifest.",
                    path.display(),
                    DEFAULT_MANIFEST
                ));
                return Ok(CommandResult::failure(1));
            }
            Err(e) => return Err(e),
        };

        let registry = build_registry(&manifest)?;
        let platform = Platform::current();
        let graph = CheckupGraph::build(&registry, platform)?;

        let interactive = self.args.interactive() && ui.is_interactive() && !is_ci();
        let options = RunOptions {
            skip: self.args.skip.clone(),
            fix: FixMode::from_flags(self.args.fix, interactive),
            interactive,
        };
        tracing::debug!(
            "Running {} check(s) on {} with {:?}",
            graph.len(),
            platform,
            options
        );

        ui.show_header("Checking environment");
        let mut state = SharedState::new();
        let report = CheckupRunner::new(&graph, options)
            .with_platform(platform)
            .run(&mut state, ui)?;

        if self.args.json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| CheckupError::Other(e.into()))?;
            println!("{}", json);
        } else {
            ui.show_summary(&report);
        }

        if report.success() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(report.exit_code()))
        }
    }
}
