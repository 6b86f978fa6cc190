//! Embedded asset tree: builder templates, guest scripts, unattended
//! install answer files, Vagrantfiles and the example config/profile
//! seeded on first run. Everything ships inside the binary and gets
//! materialized into the build scratch directory when needed.

use std::fs;
use std::path::Path;

use include_dir::{Dir, DirEntry, include_dir};

use crate::domain::AppError;

static ASSETS: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/assets");

/// Source of a builder template by name, e.g. `win10_64_analyst`.
pub fn builder_template(name: &str) -> Option<&'static str> {
    ASSETS
        .get_file(format!("templates/{name}.json"))
        .and_then(|file| file.contents_utf8())
}

/// Names of all embedded builder templates, sorted.
pub fn list_builder_templates() -> Vec<String> {
    let Some(dir) = ASSETS.get_dir("templates") else {
        return Vec::new();
    };

    let mut names = Vec::new();
    for entry in dir.entries() {
        if let DirEntry::File(file) = entry
            && let Some(stem) = file.path().file_stem()
        {
            names.push(stem.to_string_lossy().to_string());
        }
    }

    names.sort();
    names
}

/// A guest-side script or task XML under `scripts/windows/`.
pub fn guest_script(name: &str) -> Result<&'static str, AppError> {
    ASSETS
        .get_file(format!("scripts/windows/{name}"))
        .and_then(|file| file.contents_utf8())
        .ok_or_else(|| AppError::config_error(format!("Missing embedded script: {name}")))
}

/// Unattended install answer file for a guest OS type, e.g.
/// `windows10_64`.
pub fn autounattend(os_type: &str) -> Result<&'static str, AppError> {
    ASSETS
        .get_file(format!("installconfig/{os_type}/Autounattend.xml"))
        .and_then(|file| file.contents_utf8())
        .ok_or_else(|| {
            AppError::config_error(format!("No unattended install config for OS type: {os_type}"))
        })
}

/// Analyst Vagrantfile template by file name.
pub fn vagrantfile(name: &str) -> Result<&'static str, AppError> {
    ASSETS
        .get_file(format!("vagrantfiles/{name}"))
        .and_then(|file| file.contents_utf8())
        .ok_or_else(|| AppError::config_error(format!("Missing embedded Vagrantfile: {name}")))
}

/// Example config seeded into the user config dir on first run.
pub fn config_example() -> &'static str {
    ASSETS
        .get_file("config-example.js")
        .and_then(|file| file.contents_utf8())
        .unwrap_or_default()
}

/// Example profile seeded when a selected profile has no file yet.
pub fn profile_example() -> &'static str {
    ASSETS
        .get_file("profile-example.js")
        .and_then(|file| file.contents_utf8())
        .unwrap_or_default()
}

/// Copy the whole asset tree under `dest`, preserving layout. The
/// builder template references its scripts by path, so the build
/// scratch directory needs a real on-disk copy.
pub fn materialize(dest: &Path) -> Result<(), AppError> {
    materialize_dir(&ASSETS, dest)
}

fn materialize_dir(dir: &Dir<'_>, dest: &Path) -> Result<(), AppError> {
    for entry in dir.entries() {
        match entry {
            DirEntry::Dir(subdir) => {
                fs::create_dir_all(dest.join(subdir.path()))?;
                materialize_dir(subdir, dest)?;
            }
            DirEntry::File(file) => {
                let target = dest.join(file.path());
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(target, file.contents())?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    use super::*;

    #[test]
    fn template_listing_is_sorted_and_complete() {
        let names = list_builder_templates();
        assert!(names.contains(&"win10_64_analyst".to_string()));
        assert!(names.contains(&"win7_64_analyst".to_string()));
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn known_template_resolves_and_unknown_does_not() {
        assert!(builder_template("win10_64_analyst").is_some());
        assert!(builder_template("solaris_sparc").is_none());
    }

    #[test]
    fn startup_scripts_are_embedded() {
        for name in [
            "cleanup.ps1",
            "disable_winrm.ps1",
            "virtualbox_hide_artifacts.ps1",
            "set_static_ip.ps1",
            "add-shortcut.ps1",
            "add_to_recent_files.cs",
            "set_resolution_win7.cs",
            "task_scheduler_inline.xml",
            "task_scheduler_file.xml",
            "task_scheduler_csharp.xml",
        ] {
            assert!(guest_script(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn autounattend_exists_per_supported_os_type() {
        assert!(autounattend("windows10_64").is_ok());
        assert!(autounattend("windows7_64").is_ok());
        assert!(autounattend("beos").is_err());
    }

    #[test]
    fn materialize_writes_the_full_tree() {
        let temp = assert_fs::TempDir::new().unwrap();
        materialize(temp.path()).unwrap();
        temp.child("scripts/windows/cleanup.ps1")
            .assert(predicate::path::is_file());
        temp.child("templates/win10_64_analyst.json")
            .assert(predicate::path::is_file());
        temp.child("config-example.js")
            .assert(predicate::path::is_file());
    }

    #[test]
    fn materialize_overwrites_an_existing_copy() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("config-example.js").write_str("stale").unwrap();
        materialize(temp.path()).unwrap();
        temp.child("config-example.js")
            .assert(predicate::str::contains("iso_name"));
    }
}
