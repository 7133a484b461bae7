//! Remediation contract.

use super::{CheckContext, Platform};
use crate::error::Result;

/// A side-effecting action intended to fix a failed check.
///
/// Remediations have no identity of their own; they are carried by the
/// [`Suggestion`](super::Suggestion) of the diagnosis that proposed them.
pub trait Remediation: Send + Sync {
    /// Short human-readable description, shown before applying.
    fn description(&self) -> String;

    /// Whether applying this remediation needs elevated privileges.
    fn requires_admin(&self, _platform: Platform) -> bool {
        false
    }

    /// Perform the fix.
    fn apply(&self, ctx: &mut CheckContext<'_>) -> Result<()>;
}
