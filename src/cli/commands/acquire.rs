//! Acquire command implementation.
//!
//! `checkup acquire <id> <version> --dest <dir>` fetches a package and its
//! dependency tree from the configured sources. With `--raw` the package
//! file is saved as-is.

use std::path::{Path, PathBuf};

use crate::acquisition::{parse_version, Acquirer, PackageSource};
use crate::cancel::CancelToken;
use crate::cli::args::AcquireArgs;
use crate::config::load_manifest;
use crate::error::{CheckupError, Result};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The acquire command implementation.
pub struct AcquireCommand {
    working_dir: PathBuf,
    manifest: Option<String>,
    args: AcquireArgs,
}

impl AcquireCommand {
    /// Create a new acquire command.
    pub fn new(working_dir: &Path, manifest: Option<&str>, args: AcquireArgs) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            manifest: manifest.map(String::from),
            args,
        }
    }

    /// `--source` values, else the manifest's `sources`.
    fn sources(&self) -> Result<PackageSource> {
        if !self.args.sources.is_empty() {
            return Ok(PackageSource::new(self.args.sources.iter().cloned()));
        }
        match load_manifest(self.manifest.as_deref(), &self.working_dir) {
            Ok(manifest) => Ok(PackageSource::new(manifest.sources)),
            Err(CheckupError::ManifestNotFound { .. }) => Ok(PackageSource::default()),
            Err(e) => Err(e),
        }
    }

    fn dest(&self) -> PathBuf {
        self.working_dir.join(&self.args.dest)
    }
}

impl Command for AcquireCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let source = self.sources()?;
        if source.is_empty() {
            ui.error("No package sources. Pass --source or list sources in the manifest.");
            return Ok(CommandResult::failure(1));
        }

        let version = parse_version(&self.args.version)?;
        let acquirer = Acquirer::from_source(&source)?.with_layout(self.args.layout);
        let cancel = CancelToken::new();
        let dest = self.dest();
        let label = format!("{} {}", self.args.id, self.args.version);
        tracing::debug!("Acquiring {} into {} from {:?}", label, dest.display(), source.urls());

        let mut spinner = ui.start_spinner(&format!("Acquiring {}", label));

        if self.args.raw {
            return if acquirer.acquire_file(&dest, &self.args.id, &version, &cancel)? {
                spinner.finish_success(&format!("Saved {} to {}", label, dest.display()));
                Ok(CommandResult::success())
            } else {
                spinner.finish_error(&format!("{} was not found in any source", label));
                Ok(CommandResult::failure(1))
            };
        }

        let report = acquirer.acquire_tree(&dest, &self.args.id, &version, &cancel)?;
        if report.success() {
            spinner.finish_success(&format!(
                "{}: {} acquired, {} already present",
                label,
                report.acquired.len(),
                report.reused.len()
            ));
        } else {
            spinner.finish_error(&format!(
                "{}: {} package(s) failed",
                label,
                report.failed.len()
            ));
        }

        for identity in &report.acquired {
            ui.message(&format!("  + {}", identity));
        }
        for failure in &report.failed {
            ui.error(&format!("{}: {}", failure.package, failure.reason));
        }

        if report.success() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}
