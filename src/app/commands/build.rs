//! The build pipeline: load and layer configuration, pick a unique VM
//! name, compile the profile into provisioning actions, emit the plan
//! artifacts and hand them to the image builder.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::app::BuildContext;
use crate::app::commands::GlobalOptions;
use crate::app::dirs::AppDirs;
use crate::domain::config::{defaults, loader, resolve};
use crate::domain::{AppError, Configuration, Profile, vm_name};
use crate::ports::{BuildRequest, Hypervisor, ImageBuilder, ScriptCompiler, VmMetadata};
use crate::services::{EmittedPlan, PlanEmitter, StartupCompiler, assets, forward_slashes};

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub template: String,
    /// Overwrite a pre-existing build directory.
    pub force: bool,
    /// Stop after emitting the plan artifacts.
    pub plan_only: bool,
}

/// A fully resolved build, ready to run. Dropping it cleans the
/// scratch artifacts unless the context was told to persist them.
#[derive(Debug)]
pub struct ResolvedBuild {
    pub config: Configuration,
    pub user_config: Map<String, Value>,
    pub ctx: BuildContext,
    pub plan: EmittedPlan,
}

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub vm_name: String,
    pub plan_path: PathBuf,
    /// False for plan-only runs.
    pub built: bool,
}

/// Resolve configuration, profile and VM placement into an emitted
/// plan without running the builder.
pub fn resolve_plan(
    dirs: &AppDirs,
    global: &GlobalOptions,
    options: &BuildOptions,
    hypervisor: &impl Hypervisor,
    compiler: &impl ScriptCompiler,
) -> Result<ResolvedBuild, AppError> {
    dirs.ensure_initialized()?;

    // Fail on a bad template name before touching profiles or VMs.
    if assets::builder_template(&options.template).is_none() {
        return Err(AppError::UnknownTemplate(options.template.clone()));
    }

    let config_path = global.config.clone().unwrap_or_else(|| dirs.config_file());
    let raw = fs::read_to_string(&config_path)?;
    let user_config = loader::load_config(
        &raw,
        &config_path,
        &dirs.cache_dir().join("minified-config.json"),
    )?;

    let profile_name = select_profile(&user_config, global);
    let profile = load_profile(dirs, &profile_name)?;

    let mut config = resolve::resolve(
        defaults::default_settings(&dirs.iso_dir()),
        user_config.clone(),
        Some(&profile.overwrite),
        &options.template,
        &config_path,
    )?;
    config.profile = profile_name;

    if global.debug {
        println!("Computer name: {}", config.computername);
        println!("Username: {}", config.username);
        println!("Password: {}", config.password);
    }

    let (vm_dir, vm_name) = place_vm(dirs, &config, &options.template, hypervisor)?;
    config.vm_name = Some(vm_name);
    prepare_scratch_dir(&vm_dir, options.force)?;
    if global.debug {
        println!("Build directory is: {}", vm_dir.display());
    }

    let ctx = BuildContext::new(vm_dir, global.debug);
    config.cache_dir = Some(forward_slashes(ctx.scratch_dir()));
    config.config_dir = Some(forward_slashes(dirs.config_dir()));
    config.template_name = Some(options.template.clone());

    StartupCompiler::new(&ctx, compiler).apply(&mut config, &profile)?;

    let plan = PlanEmitter::new(&ctx).emit(&mut config, &options.template, &user_config)?;

    Ok(ResolvedBuild { config, user_config, ctx, plan })
}

/// Resolve a plan and run the image builder on it. On success the
/// guest credentials are stored with the VM so `creds` can recover
/// them.
pub fn execute(
    dirs: &AppDirs,
    global: &GlobalOptions,
    options: &BuildOptions,
    hypervisor: &impl Hypervisor,
    compiler: &impl ScriptCompiler,
    builder: &impl ImageBuilder,
) -> Result<BuildOutcome, AppError> {
    println!("Generating configuration files...");
    let resolved = resolve_plan(dirs, global, options, hypervisor, compiler)?;
    println!("Configuration files are ready");

    let vm_name = resolved.config.vm_name.clone().unwrap_or_default();
    let plan_path = resolved.plan.plan_path.clone();

    if options.plan_only {
        resolved.ctx.persist();
        return Ok(BuildOutcome { vm_name, plan_path, built: false });
    }

    let request = BuildRequest {
        template_path: &resolved.plan.template_path,
        var_file: &resolved.plan.var_file,
        working_dir: resolved.ctx.scratch_dir(),
        force: options.force,
        debug: global.debug,
    };
    builder.build(&request)?;

    if resolved.config.hypervisor == "virtualbox" {
        let metadata = VmMetadata {
            username: resolved.config.username.clone(),
            password: resolved.config.password.clone(),
            computername: resolved.config.computername.clone(),
            static_ip: resolved
                .config
                .set_static_ip
                .is_on()
                .then(|| resolved.config.guest_ip.clone()),
        };
        hypervisor.store_vm_metadata(&vm_name, &metadata)?;
    }

    Ok(BuildOutcome { vm_name, plan_path, built: true })
}

fn select_profile(user_config: &Map<String, Value>, global: &GlobalOptions) -> String {
    let configured = user_config
        .get("profile")
        .and_then(Value::as_str)
        .unwrap_or("default")
        .to_string();
    match &global.profile {
        Some(overridden) => {
            println!("Overwriting profile: {configured} with profile: {overridden}");
            overridden.clone()
        }
        None => configured,
    }
}

fn load_profile(dirs: &AppDirs, name: &str) -> Result<Profile, AppError> {
    let path = dirs.profile_file(name);
    if !path.is_file() {
        fs::write(&path, assets::profile_example())?;
        println!(
            "WARNING: A profile was specified but was not found on disk. Copying a default one."
        );
    }

    let raw = fs::read_to_string(&path)?;
    let document = loader::load_document(
        &raw,
        &path,
        &dirs.cache_dir().join("minified-profile.json"),
    )?;
    Profile::parse(document, &path)
}

/// Pick the VM name and the directory its build runs in. VirtualBox
/// names are made unique against the live inventory and the build goes
/// under the hypervisor's machine folder; anything else gets a random
/// suffix and a folder under the cache dir.
fn place_vm(
    dirs: &AppDirs,
    config: &Configuration,
    template: &str,
    hypervisor: &impl Hypervisor,
) -> Result<(PathBuf, String), AppError> {
    if config.hypervisor == "virtualbox" {
        let existing = hypervisor.vm_names()?;
        let base = match &config.vm_name {
            Some(name) => name.clone(),
            None => format!("{}_{}", template, config.profile),
        };
        let name = vm_name::resolve_vm_name(&base, &existing);
        let folder = hypervisor.default_machine_folder()?;
        let vm_dir = folder.join(&name);
        Ok((vm_dir, name))
    } else {
        let name = match &config.vm_name {
            Some(name) => name.clone(),
            None => vm_name::fallback_vm_name(template),
        };
        let vm_dir = dirs.vm_fallback_dir().join(&name);
        Ok((vm_dir, name))
    }
}

fn prepare_scratch_dir(vm_dir: &Path, force: bool) -> Result<(), AppError> {
    if vm_dir.exists() {
        if !force {
            return Err(AppError::BuildDirExists(vm_dir.display().to_string()));
        }
        fs::remove_dir_all(vm_dir)?;
    }
    fs::create_dir_all(vm_dir)?;
    Ok(())
}
