//! The check and remediation contracts.
//!
//! A [`Check`] is a named diagnostic probe. The runner hands it a
//! [`CheckContext`] (shared state, progress sink, cancellation token and the
//! host platform) and receives a [`Diagnosis`]. A failing diagnosis may carry
//! a [`Suggestion`] whose [`Remediation`]s the runner can apply before
//! re-examining the check.
//!
//! # Modules
//!
//! - [`diagnosis`] - `Status`, `Diagnosis`, `Suggestion`
//! - [`platform`] - Host platform detection
//! - [`progress`] - `StatusUpdate` and progress sinks
//! - [`remediation`] - The `Remediation` trait

pub mod diagnosis;
pub mod platform;
pub mod progress;
pub mod remediation;

pub use diagnosis::{Diagnosis, Status, Suggestion};
pub use platform::Platform;
pub use progress::{NullProgress, ProgressSink, RecordingProgress, StatusUpdate};
pub use remediation::Remediation;

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::state::SharedState;

/// Dependency of one check on others.
///
/// `check_id` is matched as a case-insensitive prefix against registered
/// check ids: `dotnetworkloads` covers `dotnetworkloads-6.0.100` and
/// `dotnetworkloads-7.0.100`, and `dotnet` covers all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckDependency {
    pub check_id: String,
    pub required: bool,
}

impl CheckDependency {
    /// A dependency that must pass for the dependent to run.
    pub fn required(check_id: impl Into<String>) -> Self {
        Self {
            check_id: check_id.into(),
            required: true,
        }
    }

    /// A dependency that only influences ordering.
    pub fn optional(check_id: impl Into<String>) -> Self {
        Self {
            check_id: check_id.into(),
            required: false,
        }
    }

    /// Whether a registered check id satisfies this dependency.
    pub fn matches(&self, id: &str) -> bool {
        let dep = self.check_id.as_str();
        if dep.is_empty() || id.len() < dep.len() || !id.is_char_boundary(dep.len()) {
            return false;
        }
        id[..dep.len()].eq_ignore_ascii_case(dep)
    }
}

/// Everything a check or remediation may touch while it runs.
pub struct CheckContext<'a> {
    pub state: &'a mut SharedState,
    pub progress: &'a mut dyn ProgressSink,
    pub cancel: &'a CancelToken,
    pub platform: Platform,
}

impl<'a> CheckContext<'a> {
    pub fn new(
        state: &'a mut SharedState,
        progress: &'a mut dyn ProgressSink,
        cancel: &'a CancelToken,
        platform: Platform,
    ) -> Self {
        Self {
            state,
            progress,
            cancel,
            platform,
        }
    }

    /// Push a progress update.
    pub fn report(&mut self, update: StatusUpdate) {
        self.progress.report(update);
    }
}

/// A named, idempotent diagnostic probe over the environment.
pub trait Check {
    /// Unique id, compared case-insensitively.
    fn id(&self) -> &str;

    /// Human-readable title.
    fn title(&self) -> &str;

    /// Type name used by the skip list.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Checks this one depends on. `all_ids` lists every registered id so
    /// dependencies can be computed dynamically.
    fn dependencies(&self, _all_ids: &[String]) -> Vec<CheckDependency> {
        Vec::new()
    }

    fn is_platform_supported(&self, _platform: Platform) -> bool {
        true
    }

    /// Gate evaluated before dependencies; `false` marks the check as not applicable.
    fn should_examine(&self, _state: &SharedState) -> bool {
        true
    }

    /// Examine the environment. Errors are downgraded to an error diagnosis.
    fn examine(&self, ctx: &mut CheckContext<'_>) -> Result<Diagnosis>;
}

/// Source of checks derived from data, e.g. one check per declared SDK version.
pub trait CheckContributor {
    fn contribute(&self) -> Vec<Box<dyn Check>>;
}
