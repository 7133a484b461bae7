//! File presence check.

use std::fs;
use std::path::PathBuf;

use super::remedies::WriteFileRemediation;
use super::CheckMeta;
use crate::checkup::{Check, CheckContext, CheckDependency, Diagnosis, Platform, Suggestion};
use crate::config::FileConfig;
use crate::error::Result;

/// Asserts a file exists and optionally contains some text.
#[derive(Debug, Clone)]
pub struct FileCheck {
    meta: CheckMeta,
    path: PathBuf,
    contains: Option<String>,
    content: Option<String>,
}

impl FileCheck {
    pub fn from_config(config: &FileConfig) -> Self {
        Self {
            meta: CheckMeta::new(
                &config.id,
                config.title.as_deref(),
                &config.platforms,
                &config.depends_on,
            ),
            path: config.path.clone(),
            contains: config.contains.clone(),
            content: config.content.clone(),
        }
    }

    fn failed(&self, message: String) -> Diagnosis {
        let diagnosis = Diagnosis::error(self.id(), message);
        match &self.content {
            Some(content) => diagnosis.with_suggestion(
                Suggestion::new(format!("Write {}", self.path.display())).with_remediation(
                    Box::new(WriteFileRemediation::new(&self.path, content.as_str())),
                ),
            ),
            None => diagnosis,
        }
    }
}

impl Check for FileCheck {
    fn id(&self) -> &str {
        &self.meta.id
    }

    fn title(&self) -> &str {
        &self.meta.title
    }

    fn type_name(&self) -> &'static str {
        "FileCheck"
    }

    fn dependencies(&self, _all_ids: &[String]) -> Vec<CheckDependency> {
        self.meta.dependencies()
    }

    fn is_platform_supported(&self, platform: Platform) -> bool {
        self.meta.supports(platform)
    }

    fn examine(&self, _ctx: &mut CheckContext<'_>) -> Result<Diagnosis> {
        if !self.path.is_file() {
            return Ok(self.failed(format!("{} is missing", self.path.display())));
        }
        if let Some(needle) = &self.contains {
            let text = fs::read_to_string(&self.path)?;
            if !text.contains(needle.as_str()) {
                return Ok(self.failed(format!(
                    "{} does not contain '{}'",
                    self.path.display(),
                    needle
                )));
            }
        }
        Ok(Diagnosis::ok(self.id()).with_message(self.path.display().to_string()))
    }
}
