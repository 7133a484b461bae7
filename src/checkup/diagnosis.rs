//! Check results.
//!
//! Each examination produces one immutable [`Diagnosis`]: a [`Status`], an
//! optional human-readable message, and an optional [`Suggestion`] bundling
//! the remediations that may fix the problem.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::remediation::Remediation;

/// Outcome of examining a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Warning,
    Error,
}

impl Status {
    /// Whether the status fails a run.
    pub fn is_error(self) -> bool {
        matches!(self, Status::Error)
    }
}

/// Immutable result of one check examination.
pub struct Diagnosis {
    status: Status,
    owner: String,
    message: Option<String>,
    suggestion: Option<Suggestion>,
}

impl Diagnosis {
    /// Create a diagnosis with an explicit status.
    pub fn new(status: Status, owner: impl Into<String>, message: Option<String>) -> Self {
        Self {
            status,
            owner: owner.into(),
            message,
            suggestion: None,
        }
    }

    /// A passing diagnosis.
    pub fn ok(owner: impl Into<String>) -> Self {
        Self::new(Status::Ok, owner, None)
    }

    /// A warning diagnosis.
    pub fn warning(owner: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Status::Warning, owner, Some(message.into()))
    }

    /// An error diagnosis.
    pub fn error(owner: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Status::Error, owner, Some(message.into()))
    }

    /// Attach a suggestion.
    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    /// Attach a message to a diagnosis created without one.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Id of the check that produced this diagnosis.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn suggestion(&self) -> Option<&Suggestion> {
        self.suggestion.as_ref()
    }

    /// Whether a suggestion with at least one remediation is attached.
    pub fn has_remediation(&self) -> bool {
        self.suggestion.as_ref().is_some_and(Suggestion::has_remediation)
    }
}

impl fmt::Debug for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnosis")
            .field("status", &self.status)
            .field("owner", &self.owner)
            .field("message", &self.message)
            .field("suggestion", &self.suggestion)
            .finish()
    }
}

/// Human-readable fix proposal with the remediations that implement it.
pub struct Suggestion {
    name: String,
    description: Option<String>,
    remediations: Vec<Box<dyn Remediation>>,
}

impl Suggestion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            remediations: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a remediation; remediations are applied in insertion order.
    pub fn with_remediation(mut self, remediation: Box<dyn Remediation>) -> Self {
        self.remediations.push(remediation);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn remediations(&self) -> &[Box<dyn Remediation>] {
        &self.remediations
    }

    pub fn has_remediation(&self) -> bool {
        !self.remediations.is_empty()
    }
}

impl fmt::Debug for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let remediations: Vec<String> =
            self.remediations.iter().map(|r| r.description()).collect();
        f.debug_struct("Suggestion")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("remediations", &remediations)
            .finish()
    }
}
