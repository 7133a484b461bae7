//! Aggregated result of one run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Final status of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Ok,
    Warning,
    Error,
    /// Forced by the skip list or by a failed required dependency.
    Skipped,
    /// `should_examine` returned false.
    NotApplicable,
}

impl OutcomeStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Ok => "✓",
            Self::Warning => "⚠",
            Self::Error => "✗",
            Self::Skipped => "○",
            Self::NotApplicable => "-",
        }
    }
}

/// What happened to the remediation offered for a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationOutcome {
    #[default]
    NotOffered,
    Declined,
    Applied,
    Failed,
}

/// Outcome of a single check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub id: String,
    pub title: String,
    pub status: OutcomeStatus,
    pub message: Option<String>,
    pub remediation: RemediationOutcome,
    /// Number of times `examine` ran.
    pub attempts: u32,
}

impl CheckOutcome {
    pub fn new(id: impl Into<String>, title: impl Into<String>, status: OutcomeStatus) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status,
            message: None,
            remediation: RemediationOutcome::NotOffered,
            attempts: 0,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Result of a run, in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_duration_ms", rename = "duration_ms")]
    pub duration: Duration,
    pub outcomes: Vec<CheckOutcome>,
}

fn serialize_duration_ms<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            duration: Duration::ZERO,
            outcomes: Vec::new(),
        }
    }

    /// Passes when no examined check ended in error. Skipped checks and
    /// warnings do not fail the run.
    pub fn success(&self) -> bool {
        !self
            .outcomes
            .iter()
            .any(|o| o.status == OutcomeStatus::Error)
    }

    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }

    pub fn outcome(&self, id: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.id.eq_ignore_ascii_case(id))
    }

    pub fn errors(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.with_status(OutcomeStatus::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.with_status(OutcomeStatus::Warning)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.with_status(OutcomeStatus::Skipped)
    }

    fn with_status(&self, status: OutcomeStatus) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(move |o| o.status == status)
    }
}
