//! Host-side C# checking through PowerShell's `Add-Type`. Tries
//! `pwsh` first, then Windows PowerShell, and reports when neither is
//! installed so callers can degrade to a warning.

use std::io;
use std::path::Path;
use std::process::Command;

use crate::domain::AppError;
use crate::ports::{CheckOutcome, ScriptCompiler};

const CANDIDATES: &[&str] = &["pwsh", "powershell"];

#[derive(Debug, Clone, Default)]
pub struct PowershellCompiler;

impl PowershellCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl ScriptCompiler for PowershellCompiler {
    fn check(&self, source: &Path) -> Result<CheckOutcome, AppError> {
        let quoted = format!("'{}'", source.display());

        for binary in CANDIDATES {
            let result = Command::new(binary)
                .args(["-Command", "Add-Type", "-Path", &quoted])
                .output();

            let output = match result {
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(AppError::Io(err)),
                Ok(output) => output,
            };

            if output.status.success() {
                return Ok(CheckOutcome::Passed);
            }

            let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(AppError::CompileCheckFailed {
                path: source.display().to_string(),
                output: combined.trim().to_string(),
            });
        }

        Ok(CheckOutcome::Unavailable)
    }
}
