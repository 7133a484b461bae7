//! Process environment detection.

/// Check if running in a CI environment.
///
/// Used to force non-interactive mode in `main()` and to suppress progress
/// counters in [`NonInteractiveUI`](crate::ui::NonInteractiveUI).
/// Checks common CI environment variables: `CI`, `GITHUB_ACTIONS`,
/// `GITLAB_CI`, `CIRCLECI`, `TRAVIS`, `JENKINS_URL`, `TF_BUILD`.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS", "JENKINS_URL", "TF_BUILD"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Check if running as root/admin.
///
/// Remediations that require administrator rights are refused when this is
/// false.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid() is a simple syscall that returns the effective user ID
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(windows)]
    {
        std::env::var("ADMIN").is_ok()
    }

    #[cfg(not(any(unix, windows)))]
    {
        false
    }
}
