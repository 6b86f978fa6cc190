use std::path::Path;

use crate::domain::AppError;

/// Result of a host-side compile check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The source compiled cleanly.
    Passed,
    /// No compiler is available on this host, the check was skipped.
    Unavailable,
}

/// Host-side syntax check for scripts shipped into the guest.
pub trait ScriptCompiler {
    /// Compile `source` without keeping the output.
    fn check(&self, source: &Path) -> Result<CheckOutcome, AppError>;
}
