//! Command-line tool check.

use regex::Regex;

use super::remedies::ShellRemediation;
use super::CheckMeta;
use crate::acquisition::parse_version;
use crate::checkup::{Check, CheckContext, CheckDependency, Diagnosis, Platform, StatusUpdate, Suggestion};
use crate::config::ToolConfig;
use crate::error::{CheckupError, Result};
use crate::shell::{execute, CommandOptions};

const DEFAULT_VERSION_PATTERN: &str = r"(\d+\.\d+(?:\.\d+)?)";

/// Runs a version command and compares the reported version to a minimum.
#[derive(Debug, Clone)]
pub struct ToolCheck {
    meta: CheckMeta,
    command: String,
    pattern: String,
    min_version: Option<String>,
    warn_only: bool,
    install: Option<String>,
    requires_admin: bool,
}

impl ToolCheck {
    pub fn from_config(config: &ToolConfig) -> Self {
        Self {
            meta: CheckMeta::new(
                &config.id,
                config.title.as_deref(),
                &config.platforms,
                &config.depends_on,
            ),
            command: config.command.clone(),
            pattern: config
                .version_pattern
                .clone()
                .unwrap_or_else(|| DEFAULT_VERSION_PATTERN.to_string()),
            min_version: config.min_version.clone(),
            warn_only: config.warn_only,
            install: config.install.clone(),
            requires_admin: config.requires_admin,
        }
    }

    /// First version found in `output`: capture group 1, or the whole match.
    pub fn extract_version(&self, output: &str) -> Option<String> {
        let re = Regex::new(&self.pattern).ok()?;
        let caps = re.captures(output)?;
        caps.get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str().to_string())
    }

    fn suggestion(&self, name: String) -> Suggestion {
        let suggestion = Suggestion::new(name.clone());
        match &self.install {
            Some(command) => suggestion.with_remediation(Box::new(
                ShellRemediation::new(name, command.as_str()).with_admin(self.requires_admin),
            )),
            None => suggestion,
        }
    }
}

impl Check for ToolCheck {
    fn id(&self) -> &str {
        &self.meta.id
    }

    fn title(&self) -> &str {
        &self.meta.title
    }

    fn type_name(&self) -> &'static str {
        "ToolCheck"
    }

    fn dependencies(&self, _all_ids: &[String]) -> Vec<CheckDependency> {
        self.meta.dependencies()
    }

    fn is_platform_supported(&self, platform: Platform) -> bool {
        self.meta.supports(platform)
    }

    fn examine(&self, ctx: &mut CheckContext<'_>) -> Result<Diagnosis> {
        ctx.report(StatusUpdate::info(format!("Running {}", self.command)));
        let options = CommandOptions::captured(ctx.state.env_vars());
        let output = match execute(&self.command, &options, ctx.cancel) {
            Ok(result) if result.success => format!("{}\n{}", result.stdout, result.stderr),
            Ok(_) | Err(CheckupError::CommandFailed { .. }) => {
                return Ok(Diagnosis::error(
                    self.id(),
                    format!("{} not found", self.title()),
                )
                .with_suggestion(self.suggestion(format!("Install {}", self.title()))));
            }
            Err(e) => return Err(e),
        };

        let Some(found) = self.extract_version(&output) else {
            return Ok(Diagnosis::warning(
                self.id(),
                format!("Could not determine the {} version", self.title()),
            ));
        };
        ctx.state.contribute(self.id(), "version", &found);

        let Some(min) = &self.min_version else {
            return Ok(Diagnosis::ok(self.id()).with_message(found));
        };
        let installed = parse_version(&found)?;
        let required = parse_version(min)?;
        if installed >= required {
            return Ok(Diagnosis::ok(self.id()).with_message(found));
        }

        let message = format!("{} {} is older than {}", self.title(), found, min);
        let diagnosis = if self.warn_only {
            Diagnosis::warning(self.id(), message)
        } else {
            Diagnosis::error(self.id(), message)
        };
        Ok(diagnosis.with_suggestion(self.suggestion(format!("Upgrade {} to {}", self.title(), min))))
    }
}
