use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::AppError;
use crate::services::assets;

/// Well-known per-user directories. Configuration (config.js and
/// profiles) lives under the platform config dir, everything heavy
/// (ISOs, VM build folders when no hypervisor folder applies) under
/// the cache dir.
#[derive(Debug, Clone)]
pub struct AppDirs {
    config_dir: PathBuf,
    cache_dir: PathBuf,
}

impl AppDirs {
    /// Locate the platform directories for this user.
    pub fn discover() -> Result<Self, AppError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::config_error("Could not determine the user config directory"))?
            .join("boxforge");
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| AppError::config_error("Could not determine the user cache directory"))?
            .join("boxforge");
        Ok(Self { config_dir, cache_dir })
    }

    /// Explicit roots, used by tests.
    pub fn new(config_dir: PathBuf, cache_dir: PathBuf) -> Self {
        Self { config_dir, cache_dir }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.js")
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.config_dir.join("profiles")
    }

    pub fn profile_file(&self, name: &str) -> PathBuf {
        self.profiles_dir().join(format!("{name}.js"))
    }

    pub fn iso_dir(&self) -> PathBuf {
        self.cache_dir.join("iso")
    }

    /// Where VM build folders go when the hypervisor has no machine
    /// folder of its own.
    pub fn vm_fallback_dir(&self) -> PathBuf {
        self.cache_dir.join("vms")
    }

    /// Create the directory layout and seed config.js on first run.
    pub fn ensure_initialized(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.config_dir)?;
        fs::create_dir_all(self.profiles_dir())?;
        fs::create_dir_all(&self.cache_dir)?;
        fs::create_dir_all(self.iso_dir())?;

        let config_file = self.config_file();
        if !config_file.is_file() {
            println!(
                "Default configuration doesn't exist. Populating one: {}",
                config_file.display()
            );
            fs::write(&config_file, assets::config_example())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_dirs(root: &Path) -> AppDirs {
        AppDirs::new(root.join("config"), root.join("cache"))
    }

    #[test]
    fn first_run_creates_layout_and_seeds_config() {
        let root = TempDir::new().unwrap();
        let dirs = test_dirs(root.path());
        dirs.ensure_initialized().unwrap();

        assert!(dirs.profiles_dir().is_dir());
        assert!(dirs.iso_dir().is_dir());
        let seeded = fs::read_to_string(dirs.config_file()).unwrap();
        assert_eq!(seeded, assets::config_example());
    }

    #[test]
    fn existing_config_is_left_alone() {
        let root = TempDir::new().unwrap();
        let dirs = test_dirs(root.path());
        fs::create_dir_all(dirs.config_dir()).unwrap();
        fs::write(dirs.config_file(), "{\"cpus\": \"8\"}").unwrap();

        dirs.ensure_initialized().unwrap();
        assert_eq!(
            fs::read_to_string(dirs.config_file()).unwrap(),
            "{\"cpus\": \"8\"}"
        );
    }

    #[test]
    fn profile_paths_are_under_the_profiles_dir() {
        let root = TempDir::new().unwrap();
        let dirs = test_dirs(root.path());
        assert_eq!(
            dirs.profile_file("default"),
            root.path().join("config/profiles/default.js")
        );
    }
}
