//! boxforge: builds reproducible Windows VM images for malware analysis
//! from layered configuration and provisioning profiles.

pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

use std::env;
use std::path::PathBuf;

use app::commands::{build, creds, list, spin};
use app::dirs::AppDirs;
use services::{PackerBuilder, PowershellCompiler, VBoxManageHypervisor};

pub use app::commands::GlobalOptions;
pub use app::commands::build::{BuildOptions, BuildOutcome};
pub use app::commands::spin::SpinOptions;
pub use domain::AppError;
pub use ports::VmMetadata;

/// List the builder templates shipped in the binary.
pub fn list_templates() -> Vec<String> {
    list::execute()
}

/// Build a VM image from a template.
///
/// Resolves configuration and profile, emits the build plan into the
/// VM's build directory and runs the image builder on it. With
/// `plan_only` the builder is skipped and the emitted plan is kept.
pub fn build(global: &GlobalOptions, options: &BuildOptions) -> Result<BuildOutcome, AppError> {
    let dirs = AppDirs::discover()?;
    let hypervisor = VBoxManageHypervisor::new();
    let compiler = PowershellCompiler::new();
    let builder = PackerBuilder::new();

    let outcome = build::execute(&dirs, global, options, &hypervisor, &compiler, &builder)?;
    if outcome.built {
        println!("Build complete. VM registered as: {}", outcome.vm_name);
    } else {
        println!("Plan written to: {}", outcome.plan_path.display());
    }
    Ok(outcome)
}

/// Generate an analyst Vagrantfile in the current directory for a
/// built image.
pub fn spin(global: &GlobalOptions, options: &SpinOptions) -> Result<PathBuf, AppError> {
    let dirs = AppDirs::discover()?;
    let hypervisor = VBoxManageHypervisor::new();
    let compiler = PowershellCompiler::new();
    let target_dir = env::current_dir()?;

    let path = spin::execute(&dirs, global, options, &hypervisor, &compiler, &target_dir)?;
    println!(
        "Vagrantfile generated. You can move it in your analysis directory \
         and issue a `vagrant up` to get started with your VM."
    );
    Ok(path)
}

/// Print the credentials stored with a built VM.
pub fn creds(vm_name: &str) -> Result<VmMetadata, AppError> {
    let hypervisor = VBoxManageHypervisor::new();

    let metadata = creds::execute(vm_name, &hypervisor)?;
    println!(
        "username: {} password: {}",
        metadata.username, metadata.password
    );
    println!("computername: {}", metadata.computername);
    if let Some(ip) = &metadata.static_ip {
        println!("static_ip: {ip}");
    }
    Ok(metadata)
}
