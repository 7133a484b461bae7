//! Shell command execution.

use crate::cancel::CancelToken;
use crate::error::{CheckupError, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables layered over the process environment.
    pub env: HashMap<String, String>,

    /// Capture stdout (if false, inherits from parent).
    pub capture_stdout: bool,

    /// Capture stderr (if false, inherits from parent).
    pub capture_stderr: bool,

    /// Timeout in seconds (None = wait until exit or cancellation).
    pub timeout: Option<u64>,
}

impl CommandOptions {
    /// Capture both streams and pass `env` to the child.
    pub fn captured(env: &HashMap<String, String>) -> Self {
        Self {
            env: env.clone(),
            capture_stdout: true,
            capture_stderr: true,
            ..Default::default()
        }
    }
}

/// Execute a shell command, blocking until it exits.
///
/// The cancel token is polled while the child runs; once it flips the child
/// is killed and `CheckupError::Cancelled` is returned.
pub fn execute(
    command: &str,
    options: &CommandOptions,
    cancel: &CancelToken,
) -> Result<CommandResult> {
    cancel.check()?;
    let start = Instant::now();

    let mut cmd = Command::new(shell_program());
    cmd.arg(shell_flag());
    cmd.arg(command);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null());
    cmd.stdout(if options.capture_stdout {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });
    cmd.stderr(if options.capture_stderr {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });

    tracing::debug!("Running: {}", command);
    let mut child = cmd.spawn().map_err(|e| {
        tracing::debug!("Failed to spawn '{}': {}", command, e);
        CheckupError::CommandFailed {
            command: command.to_string(),
            code: None,
        }
    })?;

    let stdout_reader = child.stdout.take().map(drain);
    let stderr_reader = child.stderr.take().map(drain);

    let deadline = options.timeout.map(|secs| start + Duration::from_secs(secs));
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if cancel.is_cancelled() {
            kill(&mut child, command);
            return Err(CheckupError::Cancelled);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            kill(&mut child, command);
            return Err(CheckupError::CommandFailed {
                command: format!("{} (timed out)", command),
                code: None,
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = stdout_reader
        .and_then(|h| h.join().ok())
        .unwrap_or_default();
    let stderr = stderr_reader
        .and_then(|h| h.join().ok())
        .unwrap_or_default();

    Ok(CommandResult {
        exit_code: status.code(),
        stdout,
        stderr,
        duration: start.elapsed(),
        success: status.success(),
    })
}

/// Execute a command and return success/failure.
pub fn execute_check(command: &str, env: &HashMap<String, String>, cancel: &CancelToken) -> bool {
    execute(command, &CommandOptions::captured(env), cancel)
        .map(|r| r.success)
        .unwrap_or(false)
}

fn drain<R: Read + Send + 'static>(mut stream: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stream.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn kill(child: &mut Child, command: &str) {
    tracing::debug!("Killing '{}'", command);
    let _ = child.kill();
    let _ = child.wait();
}

fn shell_program() -> String {
    if cfg!(target_os = "windows") {
        std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
    } else {
        "/bin/sh".to_string()
    }
}

fn shell_flag() -> &'static str {
    if cfg!(target_os = "windows") {
        "/C"
    } else {
        "-c"
    }
}
