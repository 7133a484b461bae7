//! Non-interactive UI for CI/headless environments.

use std::collections::HashMap;

use crate::error::Result;
use crate::runner::RunReport;

use super::theme::CheckupTheme;
use super::{format_duration, parse_answer, OutputMode, Prompt, SpinnerHandle, UserInterface};

/// UI implementation for non-interactive mode.
///
/// Confirm prompts are answered from `CHECKUP_PROMPT_<KEY>` environment
/// variables, falling back to the prompt default. Progress counters are
/// suppressed in CI since they only add noise to build logs.
pub struct NonInteractiveUI {
    mode: OutputMode,
    env_overrides: HashMap<String, String>,
    is_ci: bool,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            env_overrides: prompt_overrides(),
            is_ci: crate::shell::is_ci(),
        }
    }

    /// Create with explicit overrides (for testing).
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            env_overrides: overrides,
            is_ci: false,
        }
    }
}

fn prompt_overrides() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("CHECKUP_PROMPT_"))
        .collect()
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn confirm(&mut self, prompt: &Prompt) -> Result<bool> {
        let env_key = format!("CHECKUP_PROMPT_{}", prompt.key.to_uppercase());
        let answer = self
            .env_overrides
            .get(&env_key)
            .and_then(|value| parse_answer(value))
            .unwrap_or(prompt.default);
        tracing::debug!("Answered '{}' with {} (non-interactive)", prompt.key, answer);
        Ok(answer)
    }

    fn start_spinner(&mut self, _message: &str) -> Box<dyn SpinnerHandle> {
        Box::new(LineSpinner {
            mode: self.mode,
            theme: CheckupTheme::plain(),
        })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("\n◆ {}\n", title);
        }
    }

    fn show_progress(&mut self, current: usize, total: usize) {
        if self.is_ci {
            return;
        }
        if self.mode.shows_detail() {
            println!("[{}/{}]", current, total);
        }
    }

    fn show_summary(&mut self, report: &RunReport) {
        if !self.mode.shows_status() {
            return;
        }

        println!();
        println!("  ┌─ Summary ──────────────────────────");
        for outcome in &report.outcomes {
            println!(
                "  │ {} {:<24} {}",
                outcome.status.icon(),
                outcome.title,
                outcome.message.as_deref().unwrap_or("")
            );
        }
        println!("  ├────────────────────────────────────");
        println!(
            "  │ {} · {} errors · {} warnings · {} skipped",
            format_duration(report.duration),
            report.errors().count(),
            report.warnings().count(),
            report.skipped().count(),
        );
        println!("  └────────────────────────────────────");

        if report.success() {
            println!("✓ Environment OK");
        } else {
            let failed: Vec<&str> = report.errors().map(|o| o.id.as_str()).collect();
            eprintln!("✗ Environment has problems: {}", failed.join(", "));
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner that prints only the final line.
struct LineSpinner {
    mode: OutputMode,
    theme: CheckupTheme,
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", self.theme.format_success(msg));
        }
    }

    fn finish_warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", self.theme.format_warning(msg));
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_error(msg));
    }

    fn finish_skipped(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", self.theme.format_skipped(msg));
        }
    }
}
