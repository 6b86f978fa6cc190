use std::path::Path;

use crate::domain::AppError;

/// Everything the image builder needs for one run.
#[derive(Debug, Clone)]
pub struct BuildRequest<'a> {
    pub template_path: &'a Path,
    pub var_file: &'a Path,
    pub working_dir: &'a Path,
    pub force: bool,
    pub debug: bool,
}

/// Tool that turns a builder template into a registered VM image.
pub trait ImageBuilder {
    /// Run a build to completion, streaming its output to the console.
    fn build(&self, request: &BuildRequest<'_>) -> Result<(), AppError>;
}
