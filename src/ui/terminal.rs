//! Interactive terminal UI.

use console::Term;
use std::io::Write;

use crate::error::Result;
use crate::runner::{OutcomeStatus, RunReport};

use super::{
    format_duration, prompt_confirm, should_use_colors, CheckupTheme, NonInteractiveUI,
    OutputMode, ProgressSpinner, Prompt, SpinnerHandle, UserInterface,
};

/// Interactive terminal UI implementation.
pub struct TerminalUI {
    term: Term,
    theme: CheckupTheme,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode) -> Self {
        let theme = if should_use_colors() {
            CheckupTheme::new()
        } else {
            CheckupTheme::plain()
        };

        Self {
            term: Term::stdout(),
            theme,
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_error(msg)).ok();
    }

    fn confirm(&mut self, prompt: &Prompt) -> Result<bool> {
        prompt_confirm(prompt, &self.term)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            Box::new(ProgressSpinner::new(message, self.theme.clone()))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn show_progress(&mut self, current: usize, total: usize) {
        if self.mode.shows_detail() {
            writeln!(
                self.term,
                "{}",
                self.theme.dim.apply_to(format!("[{}/{}]", current, total))
            )
            .ok();
        }
    }

    fn show_summary(&mut self, report: &RunReport) {
        if !self.mode.shows_status() {
            return;
        }

        let b = &self.theme.border;
        writeln!(self.term).ok();
        writeln!(
            self.term,
            "  {} {}",
            b.apply_to("┌─"),
            b.apply_to("Summary ──────────────────────────")
        )
        .ok();

        for outcome in &report.outcomes {
            let icon = match outcome.status {
                OutcomeStatus::Ok => self.theme.success.apply_to(outcome.status.icon()),
                OutcomeStatus::Warning => self.theme.warning.apply_to(outcome.status.icon()),
                OutcomeStatus::Error => self.theme.error.apply_to(outcome.status.icon()),
                OutcomeStatus::Skipped | OutcomeStatus::NotApplicable => {
                    self.theme.dim.apply_to(outcome.status.icon())
                }
            };
            let detail = outcome.message.as_deref().unwrap_or("");
            writeln!(
                self.term,
                "  {} {} {:<24} {}",
                b.apply_to("│"),
                icon,
                outcome.title,
                self.theme.dim.apply_to(detail),
            )
            .ok();
        }

        writeln!(
            self.term,
            "  {}",
            b.apply_to("├────────────────────────────────────")
        )
        .ok();
        writeln!(
            self.term,
            "  {} {} {} {} errors {} {} warnings {} {} skipped",
            b.apply_to("│"),
            self.theme.dim.apply_to(format_duration(report.duration)),
            self.theme.dim.apply_to("·"),
            report.errors().count(),
            self.theme.dim.apply_to("·"),
            report.warnings().count(),
            self.theme.dim.apply_to("·"),
            report.skipped().count(),
        )
        .ok();
        writeln!(
            self.term,
            "  {}",
            b.apply_to("└────────────────────────────────────")
        )
        .ok();

        if report.success() {
            writeln!(self.term, "{}", self.theme.format_success("Environment OK")).ok();
        } else {
            writeln!(
                self.term,
                "{}",
                self.theme.format_error("Environment has problems")
            )
            .ok();
        }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Create the appropriate UI based on context.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    if interactive && Term::stdout().is_term() {
        Box::new(TerminalUI::new(mode))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_ui_output_mode() {
        let ui = TerminalUI::new(OutputMode::Quiet);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }

    #[test]
    fn create_ui_non_interactive() {
        let ui = create_ui(false, OutputMode::Normal);
        assert!(!ui.is_interactive());
    }

    #[test]
    fn create_ui_respects_mode() {
        let ui = create_ui(false, OutputMode::Silent);
        assert_eq!(ui.output_mode(), OutputMode::Silent);
    }
}
