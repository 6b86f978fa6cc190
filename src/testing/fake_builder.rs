use std::path::PathBuf;
use std::sync::Mutex;

use crate::domain::AppError;
use crate::ports::{BuildRequest, ImageBuilder};

/// Image builder that records what it was asked to build instead of
/// running anything.
#[derive(Default)]
pub struct FakeBuilder {
    invocations: Mutex<Vec<PathBuf>>,
}

impl FakeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Template paths handed to `build`, in call order.
    pub fn invocations(&self) -> Vec<PathBuf> {
        self.invocations.lock().unwrap().clone()
    }
}

impl ImageBuilder for FakeBuilder {
    fn build(&self, request: &BuildRequest<'_>) -> Result<(), AppError> {
        self.invocations
            .lock()
            .unwrap()
            .push(request.template_path.to_path_buf());
        Ok(())
    }
}
