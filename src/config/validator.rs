//! Manifest validation rules.
//!
//! Serde already rejects unknown fields and wrong types. This module checks
//! what serde cannot: empty or duplicate ids, unparsable versions, and
//! invalid version patterns.

use std::collections::HashSet;

use crate::acquisition::parse_version;
use crate::config::schema::Manifest;
use crate::error::{CheckupError, Result};

/// One problem found in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

/// Collect every problem instead of stopping at the first.
pub fn validate_manifest(manifest: &Manifest) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    let mut check_id = |id: &str, section: &str, errors: &mut Vec<ValidationError>| {
        if id.trim().is_empty() {
            errors.push(ValidationError::new(
                "empty-id",
                format!("An entry in '{}' has an empty id", section),
            ));
        } else if !seen.insert(id.to_lowercase()) {
            errors.push(ValidationError::new(
                "duplicate-id",
                format!("Id '{}' is declared more than once", id),
            ));
        }
    };

    for tool in &manifest.tools {
        check_id(&tool.id, "tools", &mut errors);
        if tool.command.trim().is_empty() {
            errors.push(ValidationError::new(
                "missing-command",
                format!("Tool '{}' has an empty command", tool.id),
            ));
        }
        if let Some(min) = &tool.min_version {
            if let Err(e) = parse_version(min) {
                errors.push(ValidationError::new(
                    "bad-version",
                    format!("Tool '{}': {}", tool.id, e),
                ));
            }
        }
        if let Some(pattern) = &tool.version_pattern {
            if let Err(e) = regex::Regex::new(pattern) {
                errors.push(ValidationError::new(
                    "bad-pattern",
                    format!("Tool '{}': invalid version_pattern: {}", tool.id, e),
                ));
            }
        }
    }

    for sdk in &manifest.sdks {
        check_id(&sdk.id, "sdks", &mut errors);
        if sdk.list_command.trim().is_empty() {
            errors.push(ValidationError::new(
                "missing-command",
                format!("SDK '{}' has an empty list_command", sdk.id),
            ));
        }
        for version in &sdk.versions {
            if let Err(e) = parse_version(&version.version) {
                errors.push(ValidationError::new(
                    "bad-version",
                    format!("SDK '{}': {}", sdk.id, e),
                ));
            }
            let packages = version
                .packages
                .iter()
                .map(|p| (&p.id, &p.version))
                .chain(version.descriptors.iter().map(|d| (&d.id, &d.version)));
            for (id, package_version) in packages {
                if id.trim().is_empty() {
                    errors.push(ValidationError::new(
                        "empty-id",
                        format!("SDK '{}' {} lists a package without id", sdk.id, version.version),
                    ));
                }
                if let Err(e) = parse_version(package_version) {
                    errors.push(ValidationError::new(
                        "bad-version",
                        format!("Package '{}': {}", id, e),
                    ));
                }
            }
        }
    }

    for file in &manifest.files {
        check_id(&file.id, "files", &mut errors);
        if file.path.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "missing-path",
                format!("File check '{}' has an empty path", file.id),
            ));
        }
    }

    for env in &manifest.env {
        check_id(&env.id, "env", &mut errors);
        if env.name.trim().is_empty() {
            errors.push(ValidationError::new(
                "missing-name",
                format!("Env check '{}' has an empty variable name", env.id),
            ));
        }
    }

    errors
}

/// Validate and fold every problem into one error.
pub fn validate(manifest: &Manifest) -> Result<()> {
    let errors = validate_manifest(manifest);
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    Err(CheckupError::ManifestValidation { message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{EnvConfig, PackageConfig, SdkConfig, SdkVersionConfig, ToolConfig};

    fn tool(id: &str) -> ToolConfig {
        ToolConfig {
            id: id.to_string(),
            command: format!("{} --version", id),
            ..Default::default()
        }
    }

    #[test]
    fn valid_manifest_passes() {
        let manifest = Manifest {
            tools: vec![tool("git"), tool("node")],
            ..Default::default()
        };
        assert!(validate(&manifest).is_ok());
    }

    #[test]
    fn duplicate_ids_across_sections() {
        let manifest = Manifest {
            tools: vec![tool("Java")],
            env: vec![EnvConfig {
                id: "java".to_string(),
                name: "JAVA_HOME".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let errors = validate_manifest(&manifest);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "duplicate-id");
    }

    #[test]
    fn reports_every_problem() {
        let mut bad = tool("");
        bad.min_version = Some("x.y".to_string());
        bad.version_pattern = Some("(".to_string());
        let manifest = Manifest {
            tools: vec![bad],
            sdks: vec![SdkConfig {
                id: "dotnet".to_string(),
                list_command: "dotnet --list-sdks".to_string(),
                versions: vec![SdkVersionConfig {
                    version: "six".to_string(),
                    packages: vec![PackageConfig {
                        id: "Pack".to_string(),
                        version: "".to_string(),
                    }],
                    descriptors: vec![],
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        let rules: Vec<&str> = validate_manifest(&manifest).iter().map(|e| e.rule).collect();
        assert_eq!(
            rules,
            vec!["empty-id", "bad-version", "bad-pattern", "bad-version", "bad-version"]
        );

        let err = validate(&manifest).unwrap_err();
        assert!(matches!(err, CheckupError::ManifestValidation { .. }));
    }
}
