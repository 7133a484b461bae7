//! Error types for checkup operations.
//!
//! This module defines [`CheckupError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Structural errors (a cyclic check graph) abort a run before any check executes
//! - Check and remediation faults are downgraded by the runner and never abort a run
//! - Use `anyhow::Error` (via `CheckupError::Other`) inside leaf checks for unexpected errors
//! - All errors should provide actionable messages for users

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for checkup operations.
#[derive(Debug, Error)]
pub enum CheckupError {
    /// Manifest file not found at expected location.
    #[error("Manifest not found: {path}")]
    ManifestNotFound { path: PathBuf },

    /// Failed to parse or fetch the manifest.
    #[error("Failed to load manifest from {source_name}: {message}")]
    ManifestParse {
        source_name: String,
        message: String,
    },

    /// Manifest parsed but holds invalid values.
    #[error("Invalid manifest: {message}")]
    ManifestValidation { message: String },

    /// Check dependency cycle detected.
    #[error("Circular check dependency detected: {cycle}")]
    CyclicDependency { cycle: String },

    /// Two checks registered under the same id.
    #[error("Check '{id}' is registered more than once")]
    DuplicateCheck { id: String },

    /// A check could not complete its examination.
    #[error("Check '{check}' failed: {message}")]
    CheckFailed { check: String, message: String },

    /// A remediation ran and failed.
    #[error("Remediation failed: {message}")]
    RemediationFailed { message: String },

    /// A remediation needs elevated privileges the process does not have.
    #[error("'{action}' requires administrator privileges. Re-run checkup elevated (sudo / Run as Administrator).")]
    PrivilegeDenied { action: String },

    /// External command failed.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// Package acquisition failed with a non-transient fault.
    #[error("Failed to acquire '{package}': {message}")]
    Acquisition { package: String, message: String },

    /// The run was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CheckupError {
    /// Whether this error stems from missing privileges.
    pub fn is_privilege_denied(&self) -> bool {
        match self {
            Self::PrivilegeDenied { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
            Self::Other(e) => e
                .downcast_ref::<std::io::Error>()
                .is_some_and(|io| io.kind() == std::io::ErrorKind::PermissionDenied),
            _ => false,
        }
    }
}

/// Result type alias for checkup operations.
pub type Result<T> = std::result::Result<T, CheckupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_not_found_displays_path() {
        let err = CheckupError::ManifestNotFound {
            path: PathBuf::from("/foo/checkup.yml"),
        };
        assert!(err.to_string().contains("/foo/checkup.yml"));
    }

    #[test]
    fn manifest_parse_displays_source_and_message() {
        let err = CheckupError::ManifestParse {
            source_name: "https://example.com/m.yml".into(),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("https://example.com/m.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn cyclic_dependency_displays_cycle() {
        let err = CheckupError::CyclicDependency {
            cycle: "a -> b -> a".into(),
        };
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn duplicate_check_displays_id() {
        let err = CheckupError::DuplicateCheck { id: "dotnet".into() };
        assert!(err.to_string().contains("dotnet"));
    }

    #[test]
    fn privilege_denied_suggests_elevation() {
        let err = CheckupError::PrivilegeDenied {
            action: "Install .NET SDK".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Install .NET SDK"));
        assert!(msg.contains("elevated"));
        assert!(err.is_privilege_denied());
    }

    #[test]
    fn permission_denied_io_counts_as_privilege_denied() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: CheckupError = io_err.into();
        assert!(err.is_privilege_denied());
    }

    #[test]
    fn permission_denied_inside_anyhow_counts_as_privilege_denied() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: CheckupError = anyhow::Error::from(io_err).into();
        assert!(err.is_privilege_denied());
    }

    #[test]
    fn other_io_errors_are_not_privilege_denied() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: CheckupError = io_err.into();
        assert!(matches!(err, CheckupError::Io(_)));
        assert!(!err.is_privilege_denied());
    }

    #[test]
    fn command_failed_displays_command_and_code() {
        let err = CheckupError::CommandFailed {
            command: "dotnet --list-sdks".into(),
            code: Some(1),
        };
        let msg = err.to_string();
        assert!(msg.contains("dotnet --list-sdks"));
        assert!(msg.contains("1"));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(CheckupError::Cancelled)
        }
        assert!(returns_error().is_err());
    }
}
