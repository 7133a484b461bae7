//! Built-in checks driven by the manifest.
//!
//! - [`tool`] - Command-line tools with a minimum version
//! - [`sdk`] - SDKs with required versions
//! - [`packages`] - Packages and descriptors installed into an SDK
//! - [`file`] - Files that must exist
//! - [`env`] - Environment variables that should be set
//! - [`remedies`] - Remediations shared by the checks above

pub mod env;
pub mod file;
pub mod packages;
pub mod remedies;
pub mod sdk;
pub mod tool;

pub use env::EnvVarCheck;
pub use file::FileCheck;
pub use packages::{PackagesCheck, SdkPackagesContributor};
pub use remedies::{AcquirePackagesRemediation, ShellRemediation, WriteFileRemediation};
pub use sdk::SdkCheck;
pub use tool::ToolCheck;

use crate::acquisition::PackageSource;
use crate::checkup::{CheckDependency, Platform};
use crate::config::Manifest;
use crate::error::Result;
use crate::registry::CheckRegistry;

/// Identity and placement fields every manifest check shares.
#[derive(Debug, Clone)]
pub struct CheckMeta {
    pub id: String,
    pub title: String,
    pub platforms: Vec<Platform>,
    pub depends_on: Vec<String>,
}

impl CheckMeta {
    /// Title falls back to the id.
    pub fn new(
        id: &str,
        title: Option<&str>,
        platforms: &[Platform],
        depends_on: &[String],
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.unwrap_or(id).to_string(),
            platforms: platforms.to_vec(),
            depends_on: depends_on.to_vec(),
        }
    }

    /// `depends_on` entries are required dependencies.
    pub fn dependencies(&self) -> Vec<CheckDependency> {
        self.depends_on
            .iter()
            .map(|d| CheckDependency::required(d.as_str()))
            .collect()
    }

    pub fn supports(&self, platform: Platform) -> bool {
        platform.is_in(&self.platforms)
    }
}

/// Register every check a manifest declares.
///
/// Static checks go first in manifest order (tools, sdks, files, env), then
/// the per-version package checks contributed by each SDK.
pub fn build_registry(manifest: &Manifest) -> Result<CheckRegistry> {
    let mut registry = CheckRegistry::new();
    let sources = PackageSource::new(manifest.sources.iter().cloned());

    for tool in &manifest.tools {
        registry.register(Box::new(ToolCheck::from_config(tool)))?;
    }
    for sdk in &manifest.sdks {
        registry.register(Box::new(SdkCheck::from_config(sdk)))?;
    }
    for file in &manifest.files {
        registry.register(Box::new(FileCheck::from_config(file)))?;
    }
    for env in &manifest.env {
        registry.register(Box::new(EnvVarCheck::from_config(env)))?;
    }
    for sdk in &manifest.sdks {
        let contributed =
            registry.contribute(&SdkPackagesContributor::new(sdk.clone(), sources.clone()))?;
        tracing::debug!("{} contributed {} package check(s)", sdk.id, contributed);
    }

    Ok(registry)
}
