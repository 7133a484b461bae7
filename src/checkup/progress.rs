//! Progress reporting from checks and remediations.
//!
//! Checks and remediations receive a `&mut dyn ProgressSink` through their
//! [`CheckContext`](super::CheckContext) and push [`StatusUpdate`]s into it.
//! The runner decides where updates go.

use super::Status;

/// One progress event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub message: String,
    pub status: Option<Status>,
    pub percent: Option<u8>,
}

impl StatusUpdate {
    /// Plain informational update.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            percent: None,
        }
    }

    /// Update carrying a status.
    pub fn with_status(message: impl Into<String>, status: Status) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
            percent: None,
        }
    }

    /// Update carrying a completion percentage, clamped to 100.
    pub fn progress(message: impl Into<String>, percent: u8) -> Self {
        Self {
            message: message.into(),
            status: None,
            percent: Some(percent.min(100)),
        }
    }
}

/// Receiver of progress events.
pub trait ProgressSink {
    fn report(&mut self, update: StatusUpdate);
}

/// Sink that drops every update.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&mut self, _update: StatusUpdate) {}
}

/// Sink that records updates in memory.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    updates: Vec<StatusUpdate>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> &[StatusUpdate] {
        &self.updates
    }

    /// Whether any recorded message contains `needle`.
    pub fn has_message(&self, needle: &str) -> bool {
        self.updates.iter().any(|u| u.message.contains(needle))
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&mut self, update: StatusUpdate) {
        self.updates.push(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped() {
        let update = StatusUpdate::progress("downloading", 250);
        assert_eq!(update.percent, Some(100));
    }

    #[test]
    fn recording_sink_keeps_order() {
        let mut sink = RecordingProgress::new();
        sink.report(StatusUpdate::info("first"));
        sink.report(StatusUpdate::with_status("second", Status::Warning));
        assert_eq!(sink.updates().len(), 2);
        assert_eq!(sink.updates()[1].status, Some(Status::Warning));
        assert!(sink.has_message("first"));
    }

    #[test]
    fn null_sink_accepts_anything() {
        let mut sink = NullProgress;
        sink.report(StatusUpdate::info("ignored"));
    }
}
