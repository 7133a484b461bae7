//! Sequential check execution.
//!
//! The runner walks the graph order once. Each check goes through the skip
//! list, its `should_examine` gate and its required dependencies before it is
//! examined. A failing check whose suggestion carries remediations may be
//! fixed and re-examined once; the retry is detected by the check id matching
//! the previous iteration, so a fix that does not stick cannot loop.

use chrono::Utc;
use std::collections::HashMap;
use std::time::Instant;

use crate::cancel::CancelToken;
use crate::checkup::{
    Check, CheckContext, Diagnosis, Platform, ProgressSink, Status, StatusUpdate, Suggestion,
};
use crate::error::{CheckupError, Result};
use crate::shell::is_elevated;
use crate::state::SharedState;
use crate::ui::{Prompt, SpinnerHandle, UserInterface};

use super::graph::{CheckupGraph, GraphNode};
use super::report::{CheckOutcome, OutcomeStatus, RemediationOutcome, RunReport};

/// How failing checks with a remediation are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FixMode {
    /// Ask before applying; declines when not interactive.
    #[default]
    Prompt,
    /// Apply without asking.
    Always,
    /// Never apply.
    Never,
}

impl FixMode {
    /// Pick the mode from the CLI flags.
    pub fn from_flags(fix: bool, interactive: bool) -> Self {
        match (fix, interactive) {
            (true, _) => Self::Always,
            (false, true) => Self::Prompt,
            (false, false) => Self::Never,
        }
    }
}

/// Options for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Check ids or type names to force-skip.
    pub skip: Vec<String>,
    pub fix: FixMode,
    pub interactive: bool,
}

/// Drives the checks of a [`CheckupGraph`] in order.
pub struct CheckupRunner<'g, 'r> {
    graph: &'g CheckupGraph<'r>,
    options: RunOptions,
    platform: Platform,
    elevated: bool,
    cancel: CancelToken,
}

impl<'g, 'r> CheckupRunner<'g, 'r> {
    pub fn new(graph: &'g CheckupGraph<'r>, options: RunOptions) -> Self {
        Self {
            graph,
            options,
            platform: Platform::current(),
            elevated: is_elevated(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Override elevation detection.
    pub fn with_elevated(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run every check once, retrying a remediated check at most once.
    ///
    /// Only cancellation aborts the run; check and remediation faults are
    /// downgraded into the report.
    pub fn run(&self, state: &mut SharedState, ui: &mut dyn UserInterface) -> Result<RunReport> {
        let clock = Instant::now();
        let mut report = RunReport::new(Utc::now());
        let mut cache: HashMap<String, Status> = HashMap::new();
        let nodes = self.graph.nodes();

        let mut index = 0;
        let mut previous: Option<String> = None;
        let mut current: Option<CheckOutcome> = None;

        while index < nodes.len() {
            self.cancel.check()?;

            let node = &nodes[index];
            let check = node.check();
            let id = check.id();
            let retrying = previous
                .as_deref()
                .is_some_and(|p| p.eq_ignore_ascii_case(id));
            previous = Some(id.to_string());

            if !retrying {
                ui.show_progress(index + 1, nodes.len());

                if let Some(outcome) = self.gate(node, state, &cache, ui) {
                    let cached = match outcome.status {
                        OutcomeStatus::NotApplicable => Status::Ok,
                        _ => Status::Error,
                    };
                    cache.insert(id.to_lowercase(), cached);
                    report.outcomes.push(outcome);
                    index += 1;
                    continue;
                }
            }

            let mut outcome = current
                .take()
                .unwrap_or_else(|| CheckOutcome::new(id, check.title(), OutcomeStatus::Error));
            outcome.attempts += 1;

            let diagnosis = self.examine(check, state, ui);
            outcome.status = match diagnosis.status() {
                Status::Ok => OutcomeStatus::Ok,
                Status::Warning => OutcomeStatus::Warning,
                Status::Error => OutcomeStatus::Error,
            };
            outcome.message = diagnosis.message().map(str::to_string);

            if diagnosis.status().is_error() && !retrying {
                if let Some(suggestion) = diagnosis.suggestion().filter(|s| s.has_remediation()) {
                    if self.should_fix(check, suggestion, ui)? {
                        if self.remediate(suggestion, state, ui)? {
                            tracing::debug!("Re-examining '{}' after remediation", id);
                            outcome.remediation = RemediationOutcome::Applied;
                            current = Some(outcome);
                            continue;
                        }
                        outcome.remediation = RemediationOutcome::Failed;
                    } else {
                        tracing::debug!("Remediation for '{}' declined", id);
                        outcome.remediation = RemediationOutcome::Declined;
                        ui.message(&format!("  Suggested fix: {}", suggestion.name()));
                    }
                }
            }

            tracing::debug!("Check '{}' finished as {:?}", id, outcome.status);
            cache.insert(id.to_lowercase(), diagnosis.status());
            report.outcomes.push(outcome);
            index += 1;
        }

        report.duration = clock.elapsed();
        Ok(report)
    }

    /// Decide whether a check is skipped or not applicable before examining it.
    fn gate(
        &self,
        node: &GraphNode<'_>,
        state: &SharedState,
        cache: &HashMap<String, Status>,
        ui: &mut dyn UserInterface,
    ) -> Option<CheckOutcome> {
        let check = node.check();

        if self.is_force_skipped(check) {
            tracing::debug!("Check '{}' skipped by request", check.id());
            ui.start_spinner(check.title())
                .finish_skipped(&format!("{} (skipped)", check.title()));
            return Some(
                CheckOutcome::new(check.id(), check.title(), OutcomeStatus::Skipped)
                    .with_message("Skipped by request"),
            );
        }

        if !check.should_examine(state) {
            tracing::debug!("Check '{}' not applicable", check.id());
            return Some(
                CheckOutcome::new(check.id(), check.title(), OutcomeStatus::NotApplicable)
                    .with_message("Not applicable"),
            );
        }

        if let Some(blocker) = self.failed_dependency(node, cache) {
            tracing::debug!(
                "Check '{}' skipped: required dependency '{}' did not pass",
                check.id(),
                blocker
            );
            let message = format!("Skipped because '{}' did not pass", blocker);
            ui.start_spinner(check.title())
                .finish_skipped(&format!("{} ({})", check.title(), message));
            return Some(
                CheckOutcome::new(check.id(), check.title(), OutcomeStatus::Skipped)
                    .with_message(message),
            );
        }

        None
    }

    fn is_force_skipped(&self, check: &dyn Check) -> bool {
        let type_name = check.type_name();
        let short_name = type_name.rsplit("::").next().unwrap_or(type_name);
        self.options.skip.iter().any(|s| {
            s.eq_ignore_ascii_case(check.id())
                || s.eq_ignore_ascii_case(type_name)
                || s.eq_ignore_ascii_case(short_name)
        })
    }

    /// First required dependency whose cached status is an error or missing.
    fn failed_dependency(
        &self,
        node: &GraphNode<'_>,
        cache: &HashMap<String, Status>,
    ) -> Option<String> {
        node.dependencies()
            .iter()
            .filter(|dep| dep.required)
            .flat_map(|dep| {
                node.resolved_dependencies()
                    .iter()
                    .filter(move |resolved| dep.matches(resolved))
            })
            .find(|resolved| {
                cache
                    .get(&resolved.to_lowercase())
                    .is_none_or(|status| status.is_error())
            })
            .cloned()
    }

    fn examine(
        &self,
        check: &dyn Check,
        state: &mut SharedState,
        ui: &mut dyn UserInterface,
    ) -> Diagnosis {
        tracing::debug!("Examining '{}'", check.id());
        let mut spinner = ui.start_spinner(check.title());
        let result = {
            let mut sink = SpinnerProgress::new(spinner.as_mut(), check.title());
            let mut ctx = CheckContext::new(state, &mut sink, &self.cancel, self.platform);
            check.examine(&mut ctx)
        };

        let diagnosis = match result {
            Ok(diagnosis) => diagnosis,
            Err(e) => {
                tracing::warn!("Check '{}' raised an error: {}", check.id(), e);
                Diagnosis::error(check.id(), e.to_string())
            }
        };

        let line = match diagnosis.message() {
            Some(message) => format!("{}: {}", check.title(), message),
            None => check.title().to_string(),
        };
        match diagnosis.status() {
            Status::Ok => spinner.finish_success(&line),
            Status::Warning => spinner.finish_warning(&line),
            Status::Error => spinner.finish_error(&line),
        }
        diagnosis
    }

    fn should_fix(
        &self,
        check: &dyn Check,
        suggestion: &Suggestion,
        ui: &mut dyn UserInterface,
    ) -> Result<bool> {
        match self.options.fix {
            FixMode::Always => Ok(true),
            FixMode::Never => Ok(false),
            FixMode::Prompt => {
                if !self.options.interactive || !ui.is_interactive() {
                    return Ok(false);
                }
                let prompt = Prompt::confirm(
                    format!("fix_{}", check.id().to_lowercase()),
                    format!("{}: {}?", check.title(), suggestion.name()),
                    true,
                );
                ui.confirm(&prompt)
            }
        }
    }

    /// Apply every remediation in order. Returns whether any succeeded.
    fn remediate(
        &self,
        suggestion: &Suggestion,
        state: &mut SharedState,
        ui: &mut dyn UserInterface,
    ) -> Result<bool> {
        let mut any_applied = false;

        for remediation in suggestion.remediations() {
            self.cancel.check()?;
            let description = remediation.description();

            if remediation.requires_admin(self.platform) && !self.elevated {
                let err = CheckupError::PrivilegeDenied {
                    action: description.clone(),
                };
                tracing::warn!("{}", err);
                ui.error(&err.to_string());
                continue;
            }

            tracing::debug!("Applying remediation: {}", description);
            let mut spinner = ui.start_spinner(&description);
            let result = {
                let mut sink = SpinnerProgress::new(spinner.as_mut(), &description);
                let mut ctx = CheckContext::new(state, &mut sink, &self.cancel, self.platform);
                remediation.apply(&mut ctx)
            };

            match result {
                Ok(()) => {
                    spinner.finish_success(&description);
                    any_applied = true;
                }
                Err(CheckupError::Cancelled) => {
                    spinner.finish_error(&format!("{} (cancelled)", description));
                    return Err(CheckupError::Cancelled);
                }
                Err(e) if e.is_privilege_denied() => {
                    let err = CheckupError::PrivilegeDenied {
                        action: description.clone(),
                    };
                    tracing::warn!("{}", err);
                    spinner.finish_error(&err.to_string());
                }
                Err(e) => {
                    tracing::warn!("Remediation '{}' failed: {}", description, e);
                    spinner.finish_error(&format!("{}: {}", description, e));
                }
            }
        }

        Ok(any_applied)
    }
}

/// Forwards progress updates to the spinner of the running check.
struct SpinnerProgress<'s> {
    spinner: &'s mut dyn SpinnerHandle,
    label: String,
}

impl<'s> SpinnerProgress<'s> {
    fn new(spinner: &'s mut dyn SpinnerHandle, label: &str) -> Self {
        Self {
            spinner,
            label: label.to_string(),
        }
    }
}

impl ProgressSink for SpinnerProgress<'_> {
    fn report(&mut self, update: StatusUpdate) {
        tracing::debug!("{}: {}", self.label, update.message);
        let line = match update.percent {
            Some(percent) => format!("{} · {} ({}%)", self.label, update.message, percent),
            None => format!("{} · {}", self.label, update.message),
        };
        self.spinner.set_message(&line);
    }
}
