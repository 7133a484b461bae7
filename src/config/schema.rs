//! Manifest schema definitions.
//!
//! These structs map one-to-one onto `checkup.yml`. The JSON schema printed
//! by `checkup schema` is derived from them with schemars.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::checkup::Platform;

/// Root of `checkup.yml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Package sources, tried in order (feed URLs or local directories).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    /// Command-line tools with an optional minimum version.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolConfig>,

    /// SDKs with required versions and their packages.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sdks: Vec<SdkConfig>,

    /// Files that must exist.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileConfig>,

    /// Environment variables that should be set.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvConfig>,
}

/// A tool found by running its version command.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Command printing the version, e.g. `git --version`.
    pub command: String,

    /// Regex whose first capture group (or whole match) is the version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,

    /// Report an outdated version as a warning instead of an error.
    #[serde(default)]
    pub warn_only: bool,

    /// Command that installs or upgrades the tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<String>,

    #[serde(default)]
    pub requires_admin: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Platform>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// An SDK whose installed versions are listed by a command.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SdkConfig {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Command listing installed versions, one per line, e.g. `dotnet --list-sdks`.
    pub list_command: String,

    /// Install command; `{version}` is replaced with the missing version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<String>,

    /// Environment variable set to the detected install root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_env: Option<String>,

    /// Package directory; defaults to `<root>/packs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packs_dir: Option<PathBuf>,

    #[serde(default)]
    pub requires_admin: bool,

    #[serde(default)]
    pub versions: Vec<SdkVersionConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Platform>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// One required SDK version and what must be installed alongside it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SdkVersionConfig {
    pub version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<PackageConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descriptors: Vec<DescriptorConfig>,
}

/// A package extracted with its dependency closure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    pub id: String,
    pub version: String,
}

/// A single file copied out of a package without extracting the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DescriptorConfig {
    pub id: String,
    pub version: String,

    /// Suffix of the archive entry to copy.
    #[serde(default = "default_descriptor_entry")]
    pub entry: String,
}

fn default_descriptor_entry() -> String {
    "WorkloadManifest.json".to_string()
}

/// A file that must exist, optionally with given content.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub path: PathBuf,

    /// Text the file must contain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,

    /// Content written by the fix. Without it the check offers no fix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Platform>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// An environment variable that should be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EnvConfig {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Variable name.
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Platform>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// Manifest JSON schema.
pub fn manifest_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(Manifest);
    serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
}
