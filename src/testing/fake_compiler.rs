use std::path::Path;

use crate::domain::AppError;
use crate::ports::{CheckOutcome, ScriptCompiler};

enum Behavior {
    Pass,
    Unavailable,
    Fail(String),
}

/// Script compiler with a scripted outcome.
pub struct StaticCompiler {
    behavior: Behavior,
}

impl StaticCompiler {
    pub fn passing() -> Self {
        Self { behavior: Behavior::Pass }
    }

    pub fn unavailable() -> Self {
        Self { behavior: Behavior::Unavailable }
    }

    pub fn failing(output: &str) -> Self {
        Self { behavior: Behavior::Fail(output.to_string()) }
    }
}

impl ScriptCompiler for StaticCompiler {
    fn check(&self, source: &Path) -> Result<CheckOutcome, AppError> {
        match &self.behavior {
            Behavior::Pass => Ok(CheckOutcome::Passed),
            Behavior::Unavailable => Ok(CheckOutcome::Unavailable),
            Behavior::Fail(output) => Err(AppError::CompileCheckFailed {
                path: source.display().to_string(),
                output: output.clone(),
            }),
        }
    }
}
