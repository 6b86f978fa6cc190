//! Vagrantfile generation for interactive analysis. Resolves the same
//! plan a build would and renders the hypervisor's analyst Vagrantfile
//! from it, so the spun-up VM matches the built image.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::app::commands::build::{self, BuildOptions};
use crate::app::commands::GlobalOptions;
use crate::app::dirs::AppDirs;
use crate::domain::AppError;
use crate::ports::{Hypervisor, ScriptCompiler};
use crate::services::{assets, templates};

#[derive(Debug, Clone)]
pub struct SpinOptions {
    /// Template the image was built from.
    pub template: String,
    /// Name for the spun-up analysis VM.
    pub name: String,
    pub force: bool,
}

/// Write a Vagrantfile into `target_dir` and return its path. Refuses
/// to clobber one that is already there.
pub fn execute(
    dirs: &AppDirs,
    global: &GlobalOptions,
    options: &SpinOptions,
    hypervisor: &impl Hypervisor,
    compiler: &impl ScriptCompiler,
    target_dir: &Path,
) -> Result<PathBuf, AppError> {
    let vagrantfile = target_dir.join("Vagrantfile");
    if vagrantfile.is_file() {
        return Err(AppError::VagrantfileExists);
    }

    let build_options = BuildOptions {
        template: options.template.clone(),
        force: options.force,
        plan_only: true,
    };
    let mut resolved = build::resolve_plan(dirs, global, &build_options, hypervisor, compiler)?;

    resolved
        .config
        .extra
        .insert("template".to_string(), Value::String(options.template.clone()));
    resolved
        .config
        .extra
        .insert("name".to_string(), Value::String(options.name.clone()));

    let source_name = match resolved.config.hypervisor.as_str() {
        "virtualbox" => "analyst_single.rb",
        "vsphere" => "analyst_vsphere.rb",
        other => {
            return Err(AppError::config_error(format!(
                "No Vagrantfile template for hypervisor: {other}"
            )));
        }
    };

    println!("Creating a Vagrantfile");
    let rendered = templates::render(
        source_name,
        assets::vagrantfile(source_name)?,
        &resolved.config,
    )?;
    fs::write(&vagrantfile, rendered)?;

    Ok(vagrantfile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeHypervisor, StaticCompiler};
    use tempfile::TempDir;

    const CONFIG: &str = r#"{
        "win10_64_iso_name": "win10_64.iso",
        "win10_64_checksum": "d41d8cd98f00b204"
    }"#;

    fn spin_options() -> SpinOptions {
        SpinOptions {
            template: "win10_64_analyst".to_string(),
            name: "dridex-triage".to_string(),
            force: false,
        }
    }

    #[test]
    fn spin_writes_a_vagrantfile_referencing_the_vm() {
        let root = TempDir::new().unwrap();
        let dirs = AppDirs::new(root.path().join("config"), root.path().join("cache"));
        dirs.ensure_initialized().unwrap();
        fs::write(dirs.config_file(), CONFIG).unwrap();
        let hypervisor = FakeHypervisor::new(&[], root.path().join("machines"));
        fs::create_dir_all(root.path().join("machines")).unwrap();
        let compiler = StaticCompiler::passing();
        let workdir = root.path().join("analysis");
        fs::create_dir_all(&workdir).unwrap();

        let path = execute(
            &dirs,
            &GlobalOptions::default(),
            &spin_options(),
            &hypervisor,
            &compiler,
            &workdir,
        )
        .unwrap();

        let rendered = fs::read_to_string(&path).unwrap();
        assert!(rendered.contains("dridex-triage"));
        assert!(rendered.contains("win10_64_analyst"));
    }

    #[test]
    fn existing_vagrantfile_is_not_clobbered() {
        let root = TempDir::new().unwrap();
        let dirs = AppDirs::new(root.path().join("config"), root.path().join("cache"));
        dirs.ensure_initialized().unwrap();
        fs::write(dirs.config_file(), CONFIG).unwrap();
        let hypervisor = FakeHypervisor::new(&[], root.path().join("machines"));
        let compiler = StaticCompiler::passing();
        let workdir = root.path().join("analysis");
        fs::create_dir_all(&workdir).unwrap();
        fs::write(workdir.join("Vagrantfile"), "# keep me").unwrap();

        let err = execute(
            &dirs,
            &GlobalOptions::default(),
            &spin_options(),
            &hypervisor,
            &compiler,
            &workdir,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::VagrantfileExists));
        assert_eq!(
            fs::read_to_string(workdir.join("Vagrantfile")).unwrap(),
            "# keep me"
        );
    }
}
