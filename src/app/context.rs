use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::AppError;

/// Per-build scratch state. Owns the build directory, hands out paths
/// inside it and remembers every file written there so intermediate
/// artifacts can be removed once the build is over. Debug mode and
/// `persist()` both leave everything in place.
#[derive(Debug)]
pub struct BuildContext {
    scratch_dir: PathBuf,
    debug: bool,
    persist: AtomicBool,
    tracked: Mutex<Vec<PathBuf>>,
}

impl BuildContext {
    pub fn new(scratch_dir: PathBuf, debug: bool) -> Self {
        Self {
            scratch_dir,
            debug,
            persist: AtomicBool::new(false),
            tracked: Mutex::new(Vec::new()),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Path of a named artifact inside the scratch directory.
    pub fn scratch_path(&self, name: &str) -> PathBuf {
        self.scratch_dir.join(name)
    }

    /// Write a tracked artifact into the scratch directory and return
    /// its path.
    pub fn write_scratch_file(&self, name: &str, contents: &str) -> Result<PathBuf, AppError> {
        let path = self.scratch_path(name);
        fs::write(&path, contents)?;
        self.track(path.clone());
        Ok(path)
    }

    /// Register an externally created artifact for cleanup.
    pub fn track(&self, path: PathBuf) {
        self.tracked.lock().unwrap().push(path);
    }

    /// Keep all artifacts when the context is dropped. Used by
    /// plan-only runs, where the artifacts are the product.
    pub fn persist(&self) {
        self.persist.store(true, Ordering::Relaxed);
    }
}

impl Drop for BuildContext {
    fn drop(&mut self) {
        if self.debug || self.persist.load(Ordering::Relaxed) {
            return;
        }
        let tracked = self.tracked.lock().unwrap();
        for path in tracked.iter().rev() {
            let result = if path.is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            };
            // Cleanup runs on every exit path; a missing file is fine.
            let _ = result;
        }
    }
}
