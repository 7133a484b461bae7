//! Transfer faults and the retry policy.

use std::fmt;
use thiserror::Error;

use crate::cancel::CancelToken;

/// Classification of a transfer fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// A connection or stream was closed underneath the transfer.
    ResourceDisposed,
    /// The operation timed out or was cancelled.
    OperationCancelled,
    /// Network or filesystem I/O failed.
    Io,
    /// The artifact could not be read as an archive or its descriptor is invalid.
    CorruptData,
    /// Anything else. Never retried.
    Fatal,
}

impl FaultKind {
    /// Whether the retry policy may try again.
    pub fn is_transient(self) -> bool {
        !matches!(self, Self::Fatal)
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResourceDisposed => "resource disposed",
            Self::OperationCancelled => "operation cancelled",
            Self::Io => "I/O failure",
            Self::CorruptData => "corrupt data",
            Self::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// A classified transfer failure.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FaultKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Io, message)
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(FaultKind::CorruptData, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Fatal, message)
    }

    pub fn cancelled() -> Self {
        Self::new(FaultKind::OperationCancelled, "cancelled")
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind;
        let kind = match e.kind() {
            ErrorKind::TimedOut | ErrorKind::Interrupted => FaultKind::OperationCancelled,
            ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted => {
                FaultKind::ResourceDisposed
            }
            ErrorKind::InvalidData | ErrorKind::UnexpectedEof => FaultKind::CorruptData,
            _ => FaultKind::Io,
        };
        Self::new(kind, e.to_string())
    }
}

impl From<zip::result::ZipError> for FetchError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => io.into(),
            other => Self::corrupt(other.to_string()),
        }
    }
}

/// Bounded retry for transient faults, without delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub additional_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            additional_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            additional_attempts: 0,
        }
    }

    /// Run `op` until it succeeds, fails with a non-transient fault, runs out
    /// of attempts, or the token is cancelled. `op` receives the zero-based
    /// attempt number.
    pub fn run<T>(
        &self,
        cancel: &CancelToken,
        label: &str,
        mut op: impl FnMut(u32) -> Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        let mut attempt = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(FetchError::cancelled());
            }
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.additional_attempts => {
                    attempt += 1;
                    tracing::warn!(
                        "{} failed ({}), retrying ({}/{})",
                        label,
                        e,
                        attempt,
                        self.additional_attempts
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_fatal_is_permanent() {
        assert!(FaultKind::ResourceDisposed.is_transient());
        assert!(FaultKind::OperationCancelled.is_transient());
        assert!(FaultKind::Io.is_transient());
        assert!(FaultKind::CorruptData.is_transient());
        assert!(!FaultKind::Fatal.is_transient());
    }

    #[test]
    fn io_errors_are_classified() {
        let timeout: FetchError = std::io::Error::from(std::io::ErrorKind::TimedOut).into();
        assert_eq!(timeout.kind, FaultKind::OperationCancelled);
        let reset: FetchError = std::io::Error::from(std::io::ErrorKind::ConnectionReset).into();
        assert_eq!(reset.kind, FaultKind::ResourceDisposed);
        let missing: FetchError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert_eq!(missing.kind, FaultKind::Io);
    }

    #[test]
    fn zip_errors_are_corrupt_data() {
        let err: FetchError = zip::result::ZipError::InvalidArchive("bad".into()).into();
        assert_eq!(err.kind, FaultKind::CorruptData);
    }

    #[test]
    fn transient_faults_get_three_more_attempts() {
        let mut calls = 0;
        let result: Result<(), FetchError> =
            RetryPolicy::default().run(&CancelToken::new(), "download", |_| {
                calls += 1;
                Err(FetchError::io("connection refused"))
            });
        assert!(result.is_err());
        assert_eq!(calls, 4);
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let result = RetryPolicy::default().run(&CancelToken::new(), "download", |attempt| {
            if attempt < 2 {
                Err(FetchError::corrupt("truncated"))
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn fatal_fault_is_not_retried() {
        let mut calls = 0;
        let result: Result<(), FetchError> =
            RetryPolicy::default().run(&CancelToken::new(), "download", |_| {
                calls += 1;
                Err(FetchError::fatal("403 Forbidden"))
            });
        assert_eq!(result.unwrap_err().kind, FaultKind::Fatal);
        assert_eq!(calls, 1);
    }

    #[test]
    fn cancellation_stops_retries() {
        let cancel = CancelToken::new();
        let mut calls = 0;
        let result: Result<(), FetchError> = RetryPolicy::default().run(&cancel, "download", |_| {
            calls += 1;
            cancel.cancel();
            Err(FetchError::io("reset"))
        });
        assert_eq!(result.unwrap_err().kind, FaultKind::OperationCancelled);
        assert_eq!(calls, 1);
    }
}
