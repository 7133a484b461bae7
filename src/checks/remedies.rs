//! Remediations offered by the built-in checks.

use std::fs;
use std::path::{Path, PathBuf};

use crate::acquisition::{parse_version, Acquirer, PackageIdentity, PackageSource};
use crate::checkup::{CheckContext, Platform, Remediation, StatusUpdate};
use crate::config::{DescriptorConfig, PackageConfig};
use crate::error::{CheckupError, Result};
use crate::shell::{execute, CommandOptions};

/// Runs a shell command with the run's environment variables.
#[derive(Debug, Clone)]
pub struct ShellRemediation {
    description: String,
    command: String,
    requires_admin: bool,
}

impl ShellRemediation {
    pub fn new(description: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            command: command.into(),
            requires_admin: false,
        }
    }

    pub fn with_admin(mut self, requires_admin: bool) -> Self {
        self.requires_admin = requires_admin;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Remediation for ShellRemediation {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn requires_admin(&self, _platform: Platform) -> bool {
        self.requires_admin
    }

    fn apply(&self, ctx: &mut CheckContext<'_>) -> Result<()> {
        ctx.report(StatusUpdate::info(format!("Running {}", self.command)));
        let options = CommandOptions::captured(ctx.state.env_vars());
        let result = execute(&self.command, &options, ctx.cancel)?;
        if result.success {
            return Ok(());
        }

        tracing::debug!("'{}' stderr: {}", self.command, result.stderr.trim());
        if result.stderr.to_lowercase().contains("permission denied") {
            return Err(CheckupError::PrivilegeDenied {
                action: self.description.clone(),
            });
        }
        Err(CheckupError::CommandFailed {
            command: self.command.clone(),
            code: result.exit_code,
        })
    }
}

/// Writes fixed content to a file, creating parent directories.
#[derive(Debug, Clone)]
pub struct WriteFileRemediation {
    path: PathBuf,
    content: String,
}

impl WriteFileRemediation {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

impl Remediation for WriteFileRemediation {
    fn description(&self) -> String {
        format!("Write {}", self.path.display())
    }

    fn apply(&self, ctx: &mut CheckContext<'_>) -> Result<()> {
        ctx.report(StatusUpdate::info(self.description()));
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, &self.content)?;
        Ok(())
    }
}

/// Installs an SDK's packages and descriptors with the acquisition engine.
///
/// Descriptors are fetched one at a time first, then packages fan out in
/// parallel.
#[derive(Debug, Clone)]
pub struct AcquirePackagesRemediation {
    sdk_id: String,
    sdk_version: String,
    packs_dir: Option<PathBuf>,
    packages: Vec<PackageConfig>,
    descriptors: Vec<DescriptorConfig>,
    sources: PackageSource,
    requires_admin: bool,
}

impl AcquirePackagesRemediation {
    pub fn new(sdk_id: &str, sdk_version: &str, sources: PackageSource) -> Self {
        Self {
            sdk_id: sdk_id.to_string(),
            sdk_version: sdk_version.to_string(),
            packs_dir: None,
            packages: Vec::new(),
            descriptors: Vec::new(),
            sources,
            requires_admin: false,
        }
    }

    pub fn with_packs_dir(mut self, packs_dir: Option<PathBuf>) -> Self {
        self.packs_dir = packs_dir;
        self
    }

    pub fn with_packages(mut self, packages: Vec<PackageConfig>) -> Self {
        self.packages = packages;
        self
    }

    pub fn with_descriptors(mut self, descriptors: Vec<DescriptorConfig>) -> Self {
        self.descriptors = descriptors;
        self
    }

    pub fn with_admin(mut self, requires_admin: bool) -> Self {
        self.requires_admin = requires_admin;
        self
    }
}

/// File name of a descriptor entry, e.g. `data/WorkloadManifest.json` -> `WorkloadManifest.json`.
pub fn descriptor_file_name(entry: &str) -> &str {
    entry.rsplit(['/', '\\']).next().unwrap_or(entry)
}

/// Directory a descriptor package lands in below `sdk-manifests/<version>`.
///
/// A `.Manifest-<band>` suffix is dropped: `Contoso.Workload.Manifest-6.0.100`
/// becomes `contoso.workload`.
pub fn descriptor_dir_name(id: &str) -> String {
    let lower = id.to_lowercase();
    match lower.find(".manifest-") {
        Some(pos) => lower[..pos].to_string(),
        None => lower,
    }
}

/// Where a descriptor for `sdk_version` is expected under an SDK root.
pub fn descriptor_path(root: &Path, sdk_version: &str, descriptor: &DescriptorConfig) -> PathBuf {
    root.join("sdk-manifests")
        .join(sdk_version)
        .join(descriptor_dir_name(&descriptor.id))
        .join(descriptor_file_name(&descriptor.entry))
}

/// Install root published by an SDK check: its own namespace first, then any.
pub fn sdk_root(state: &crate::state::SharedState, sdk_id: &str) -> Option<PathBuf> {
    state
        .try_get_state::<String>(sdk_id, "root")
        .or_else(|| {
            state
                .try_get_state_from_all::<String>("root")
                .into_iter()
                .next()
                .map(|(_, root)| root)
        })
        .map(PathBuf::from)
}

impl Remediation for AcquirePackagesRemediation {
    fn description(&self) -> String {
        format!(
            "Install {} package(s) for {} {}",
            self.packages.len() + self.descriptors.len(),
            self.sdk_id,
            self.sdk_version
        )
    }

    fn requires_admin(&self, _platform: Platform) -> bool {
        self.requires_admin
    }

    fn apply(&self, ctx: &mut CheckContext<'_>) -> Result<()> {
        let root = sdk_root(ctx.state, &self.sdk_id);
        let packs_dir = match (&self.packs_dir, &root) {
            (Some(dir), _) => dir.clone(),
            (None, Some(root)) => root.join("packs"),
            (None, None) => {
                return Err(CheckupError::RemediationFailed {
                    message: format!("install root of '{}' is unknown", self.sdk_id),
                })
            }
        };

        let acquirer = Acquirer::from_source(&self.sources)?;
        let mut failed = Vec::new();

        if !self.descriptors.is_empty() {
            let root = root.as_deref().ok_or_else(|| CheckupError::RemediationFailed {
                message: format!("install root of '{}' is unknown", self.sdk_id),
            })?;
            for descriptor in &self.descriptors {
                ctx.report(StatusUpdate::info(format!(
                    "Fetching {} {}",
                    descriptor.id, descriptor.version
                )));
                let dest = descriptor_path(root, &self.sdk_version, descriptor);
                let version = parse_version(&descriptor.version)?;
                if !acquirer.extract_descriptor(
                    &dest,
                    &descriptor.id,
                    &version,
                    &descriptor.entry,
                    ctx.cancel,
                )? {
                    failed.push(format!("{} {}", descriptor.id, descriptor.version));
                }
            }
        }

        ctx.report(StatusUpdate::info(format!(
            "Installing {} package(s) into {}",
            self.packages.len(),
            packs_dir.display()
        )));
        let roots = self
            .packages
            .iter()
            .map(|package| Ok(PackageIdentity::new(&package.id, parse_version(&package.version)?)))
            .collect::<Result<Vec<_>>>()?;
        let report = acquirer.acquire_many(&packs_dir, &roots, ctx.cancel)?;
        for failure in report.failed {
            tracing::warn!("{}: {}", failure.package, failure.reason);
            failed.push(failure.package);
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(CheckupError::RemediationFailed {
                message: format!("could not install {}", failed.join(", ")),
            })
        }
    }
}
