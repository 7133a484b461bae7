//! SDK version check.
//!
//! Lists installed versions with the manifest's list command (for example
//! `dotnet --list-sdks`, one `6.0.100 [/usr/share/dotnet/sdk]` per line) and
//! compares them with the required versions.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::remedies::ShellRemediation;
use super::CheckMeta;
use crate::acquisition::parse_version;
use crate::checkup::{Check, CheckContext, CheckDependency, Diagnosis, Platform, StatusUpdate, Suggestion};
use crate::config::SdkConfig;
use crate::error::{CheckupError, Result};
use crate::shell::{execute, CommandOptions};

static LIST_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*v?(\d+(?:\.\d+){1,3}(?:-[0-9A-Za-z.\-]+)?)(?:\s+\[(.+)\])?").ok());

/// Installed versions and install root parsed from a list command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdkListing {
    pub versions: Vec<String>,
    pub root: Option<PathBuf>,
}

/// Parse list output. A bracketed location ending in `sdk` is taken to be
/// one level below the install root.
pub fn parse_listing(output: &str) -> SdkListing {
    let mut listing = SdkListing::default();
    let Some(re) = LIST_LINE.as_ref() else {
        return listing;
    };
    for line in output.lines() {
        let Some(caps) = re.captures(line) else {
            continue;
        };
        if let Some(version) = caps.get(1) {
            listing.versions.push(version.as_str().to_string());
        }
        if listing.root.is_none() {
            if let Some(location) = caps.get(2) {
                let path = Path::new(location.as_str().trim());
                let root = match path.file_name() {
                    Some(name) if name.eq_ignore_ascii_case("sdk") => path.parent().unwrap_or(path),
                    _ => path,
                };
                listing.root = Some(root.to_path_buf());
            }
        }
    }
    listing
}

/// Verifies that every required version of an SDK is installed.
#[derive(Debug, Clone)]
pub struct SdkCheck {
    meta: CheckMeta,
    list_command: String,
    install: Option<String>,
    root_env: Option<String>,
    requires_admin: bool,
    required: Vec<String>,
}

impl SdkCheck {
    pub fn from_config(config: &SdkConfig) -> Self {
        Self {
            meta: CheckMeta::new(
                &config.id,
                config.title.as_deref(),
                &config.platforms,
                &config.depends_on,
            ),
            list_command: config.list_command.clone(),
            install: config.install.clone(),
            root_env: config.root_env.clone(),
            requires_admin: config.requires_admin,
            required: config.versions.iter().map(|v| v.version.clone()).collect(),
        }
    }

    fn missing_diagnosis(&self, message: String, missing: &[String]) -> Diagnosis {
        let mut suggestion = Suggestion::new(format!(
            "Download {} {}",
            self.title(),
            missing.join(", ")
        ));
        if let Some(install) = &self.install {
            for version in missing {
                suggestion = suggestion.with_remediation(Box::new(
                    ShellRemediation::new(
                        format!("Install {} {}", self.title(), version),
                        install.replace("{version}", version),
                    )
                    .with_admin(self.requires_admin),
                ));
            }
        }
        Diagnosis::error(self.id(), message).with_suggestion(suggestion)
    }
}

impl Check for SdkCheck {
    fn id(&self) -> &str {
        &self.meta.id
    }

    fn title(&self) -> &str {
        &self.meta.title
    }

    fn type_name(&self) -> &'static str {
        "SdkCheck"
    }

    fn dependencies(&self, _all_ids: &[String]) -> Vec<CheckDependency> {
        self.meta.dependencies()
    }

    fn is_platform_supported(&self, platform: Platform) -> bool {
        self.meta.supports(platform)
    }

    fn examine(&self, ctx: &mut CheckContext<'_>) -> Result<Diagnosis> {
        ctx.report(StatusUpdate::info(format!("Running {}", self.list_command)));
        let options = CommandOptions::captured(ctx.state.env_vars());
        let listing = match execute(&self.list_command, &options, ctx.cancel) {
            Ok(result) if result.success => parse_listing(&result.stdout),
            Ok(_) | Err(CheckupError::CommandFailed { .. }) => {
                return Ok(self.missing_diagnosis(
                    format!("{} not found", self.title()),
                    &self.required,
                ));
            }
            Err(e) => return Err(e),
        };

        ctx.state
            .contribute(self.id(), "installed_versions", &listing.versions);
        if let Some(root) = &listing.root {
            let root = root.display().to_string();
            if let Some(var) = &self.root_env {
                ctx.state.set_env(var.as_str(), root.as_str());
            }
            ctx.state.contribute(self.id(), "root", root);
        }

        let installed: Vec<_> = listing
            .versions
            .iter()
            .filter_map(|v| parse_version(v).ok())
            .collect();
        let mut missing = Vec::new();
        for version in &self.required {
            let wanted = parse_version(version)?;
            if !installed.contains(&wanted) {
                missing.push(version.clone());
            }
        }

        if missing.is_empty() {
            let message = if listing.versions.is_empty() {
                format!("{} installed", self.title())
            } else {
                listing.versions.join(", ")
            };
            return Ok(Diagnosis::ok(self.id()).with_message(message));
        }

        tracing::debug!(
            "{}: installed {:?}, missing {:?}",
            self.id(),
            listing.versions,
            missing
        );
        Ok(self.missing_diagnosis(
            format!("{} {} is not installed", self.title(), missing.join(", ")),
            &missing,
        ))
    }
}
