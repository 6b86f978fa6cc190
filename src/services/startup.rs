//! Compiles profile directives and built-in toggles into guest
//! provisioning actions. Scheduled work is expressed as task
//! scheduler XML pushed into the guest and registered with
//! `Schtasks`; provisioning-time work becomes plain upload/run
//! bundles. All intermediate files land in the build scratch
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Local;
use serde_json::json;

use crate::app::BuildContext;
use crate::domain::config::loader::expand_user;
use crate::domain::identity::random_string;
use crate::domain::profile::{Directive, Profile};
use crate::domain::{ActionBundle, AppError, Configuration, ScheduledTask, StartupAction};
use crate::ports::{CheckOutcome, ScriptCompiler};
use crate::services::{assets, templates};

/// The task scheduler rejects command arguments longer than this, so
/// base64-encoded inline payloads are capped here with a clear error
/// instead of a cryptic in-guest failure.
pub const MAX_ENCODED_PAYLOAD: usize = 32_500;

const STARTUP_FOLDER: &str = "$env:APPDATA\\Microsoft\\Windows\\Start Menu\\Programs\\Startup";
const STARTUP_FOLDER_QUOTED: &str = "$env:APPDATA\\Microsoft\\Windows\\'Start Menu'\\Programs\\Startup";

pub struct StartupCompiler<'a, C: ScriptCompiler> {
    ctx: &'a BuildContext,
    compiler: &'a C,
}

impl<'a, C: ScriptCompiler> StartupCompiler<'a, C> {
    pub fn new(ctx: &'a BuildContext, compiler: &'a C) -> Self {
        Self { ctx, compiler }
    }

    /// Run every directive and toggle against `config`, appending the
    /// compiled bundles to its action lists.
    pub fn apply(&self, config: &mut Configuration, profile: &Profile) -> Result<(), AppError> {
        if config.hypervisor == "virtualbox" && config.hide_vm_artifacts.is_on() {
            let path = self.materialize_script("virtualbox_hide_artifacts.ps1")?;
            let task = self.powershell_inline(&path.display().to_string(), None)?;
            println!(
                "Added on-startup script: {} task_name: {}",
                path.display(),
                task.task_name
            );
            config.onstartup_script.push(task.bundle);
        }

        for directive in profile.scheduled_directives() {
            self.apply_directive(config, directive)?;
        }

        let template = config.template_name.clone().unwrap_or_default();
        if template.contains("win7") {
            let source = assets::guest_script("set_resolution_win7.cs")?;
            let rendered = templates::render(
                "set_resolution_win7.cs",
                source,
                &json!({
                    "screen_width": config.screen_width,
                    "screen_height": config.screen_height,
                }),
            )?;
            let path = self
                .ctx
                .write_scratch_file("Startup-folder_setscreenres.cs", &rendered)?;
            let bundle = self.startup_folder_csharp(&path.display().to_string())?;
            println!("Added startup-folder resolution fix: {}", path.display());
            config.onstartup_script.push(bundle);
        }

        self.write_profile_script(profile, &config.profile)?;

        for directive in profile.upload_directives() {
            self.apply_directive(config, directive)?;
        }

        if config.cleanup.is_on() {
            let path = self.materialize_script("cleanup.ps1")?;
            let task = self.powershell_inline(&path.display().to_string(), Some("cleanup"))?;
            println!(
                "Added on-startup script: {} task_name: {}",
                path.display(),
                task.task_name
            );
            config.onstartup_script.push(task.bundle);
        } else {
            println!("No cleanup");
        }

        if config.winrm.is_off() {
            let path = self.materialize_script("disable_winrm.ps1")?;
            let task =
                self.powershell_inline(&path.display().to_string(), Some("disable_winrm"))?;
            println!(
                "Added on-startup script: {} task_name: {}",
                path.display(),
                task.task_name
            );
            config.onstartup_script.push(task.bundle);
        }

        if config.generate_random_files.is_on() {
            let path = self.materialize_script("add_to_recent_files.cs")?;
            let bundle = self.startup_folder_csharp(&path.display().to_string())?;
            config.upload_compile_execute.push(bundle);
        }

        if config.set_static_ip.is_on() {
            let source = assets::guest_script("set_static_ip.ps1")?;
            let rendered = templates::render(
                "set_static_ip.ps1",
                source,
                &json!({
                    "guest_ip": config.guest_ip,
                    "gateway_ip": config.gateway_ip,
                    "netmask": config.netmask,
                    "dnsserver_ip": config.dnsserver_ip,
                    "secondary_dnsserver_ip": config.secondary_dnsserver_ip,
                }),
            )?;
            let path = self.ctx.write_scratch_file("set_static_ip.ps1", &rendered)?;
            let task =
                self.powershell_inline(&path.display().to_string(), Some("set_static_ip"))?;
            config.onstartup_script.push(task.bundle);
        }

        Ok(())
    }

    fn apply_directive(
        &self,
        config: &mut Configuration,
        directive: Directive<'_>,
    ) -> Result<(), AppError> {
        match directive {
            Directive::PowershellInline(script) => {
                let task = self.powershell_inline(&script.src, script.task_name.as_deref())?;
                println!(
                    "Added onstartup_powershell_inline: src: {} task_name: {}",
                    script.src, task.task_name
                );
                config.onstartup_script.push(task.bundle);
            }
            Directive::PowershellFile(script) => {
                let task = self.powershell_file(
                    &script.src,
                    &script.dest,
                    script.task_name.as_deref(),
                )?;
                println!(
                    "Added onstartup_powershell_file: src: {} dest: {} task_name: {}",
                    script.src, script.dest, task.task_name
                );
                config.onstartup_script.push(task.bundle);
            }
            Directive::Csharp(task_spec) => {
                let task = self.csharp_task(
                    &task_spec.src,
                    &task_spec.args,
                    task_spec.task_name.as_deref(),
                )?;
                println!(
                    "Added onstartup_csharp: src: {} task_name: {}",
                    task_spec.src, task.task_name
                );
                config.onstartup_script.push(task.bundle);
            }
            Directive::UploadOnstartup(upload) => {
                let bundle = self.upload_onstartup(&upload.src)?;
                println!("Added upload_onstartup: src: {}", upload.src);
                config.upload_onstartup.push(bundle);
            }
            Directive::UploadExecute(exec) => {
                let bundle = self.upload_execute(&exec.src, &exec.args)?;
                println!("Added upload_execute: src: {}", exec.src);
                config.upload_execute.push(bundle);
            }
            Directive::UploadCompileExecute(exec) => {
                let bundle = self.upload_compile_execute(&exec.src, &exec.args)?;
                println!("Added upload_compile_execute: src: {}", exec.src);
                config.upload_compile_execute.push(bundle);
            }
        }
        Ok(())
    }

    /// Schedule a PowerShell script without leaving it on the guest's
    /// disk: the body travels base64-encoded inside the task XML.
    pub fn powershell_inline(
        &self,
        src: &str,
        task_name: Option<&str>,
    ) -> Result<ScheduledTask, AppError> {
        let src = expand_user(src);
        let task_name = effective_task_name(task_name);

        let content = read_source(&src)?;
        let encoded = encode_payload(&content);
        if encoded.len() > MAX_ENCODED_PAYLOAD {
            return Err(AppError::PayloadTooLarge {
                path: src,
                size: encoded.len(),
                limit: MAX_ENCODED_PAYLOAD,
            });
        }

        let xml = templates::render(
            "task_scheduler_inline.xml",
            assets::guest_script("task_scheduler_inline.xml")?,
            &json!({
                "base64_cmd": encoded,
                "author": random_string(8),
                "date": now_stamp(),
            }),
        )?;

        self.scheduler_task(Vec::new(), &format!("on_startup-{task_name}.xml"), &xml, &task_name)
    }

    /// Upload a PowerShell script to a fixed guest path and schedule
    /// it from there.
    pub fn powershell_file(
        &self,
        src: &str,
        dest: &str,
        task_name: Option<&str>,
    ) -> Result<ScheduledTask, AppError> {
        let src = expand_user(src);
        let task_name = effective_task_name(task_name);

        if !Path::new(&src).exists() {
            return Err(AppError::MissingSourceFile(src));
        }

        let xml = templates::render(
            "task_scheduler_file.xml",
            assets::guest_script("task_scheduler_file.xml")?,
            &json!({
                "pwsh_script": dest,
                "author": random_string(8),
                "date": now_stamp(),
            }),
        )?;

        let head = vec![StartupAction::file(src, dest)];
        self.scheduler_task(head, &format!("on_startup-{task_name}.xml"), &xml, &task_name)
    }

    /// Upload a C# source, compile it in the guest and register the
    /// binary as a scheduled startup task.
    pub fn csharp_task(
        &self,
        src: &str,
        args: &str,
        task_name: Option<&str>,
    ) -> Result<ScheduledTask, AppError> {
        let src = expand_user(src);
        let task_name = effective_task_name(task_name);
        self.check_csharp_source(&src)?;

        let stem = random_string(10);
        let dest_source = format!("$env:TEMP\\{stem}.cs");
        let dest_compiled = format!("$env:TEMP\\{stem}.exe");

        let xml = templates::render(
            "task_scheduler_csharp.xml",
            assets::guest_script("task_scheduler_csharp.xml")?,
            &json!({
                "execute": format!("%TEMP%\\{stem}.exe {args}"),
                "author": random_string(8),
                "date": now_stamp(),
            }),
        )?;

        let head = vec![
            StartupAction::file(src, dest_source.clone()),
            StartupAction::Powershell {
                inline: vec![
                    format!(
                        "Add-Type -outputtype consoleapplication -outputassembly {dest_compiled} -Path {dest_source}"
                    ),
                    format!("Remove-Item $env:TEMP\\{stem}.pdb"),
                ],
            },
        ];
        self.scheduler_task(head, &format!("on_startup_csharp-{task_name}.xml"), &xml, &task_name)
    }

    /// Compile a C# source in the guest straight into the Startup
    /// folder. No scheduler entry; the folder itself runs it at logon.
    pub fn startup_folder_csharp(&self, src: &str) -> Result<ActionBundle, AppError> {
        let src = expand_user(src);
        self.check_csharp_source(&src)?;

        let stem = random_string(10);
        let dest_source = format!("$env:TEMP\\{stem}.cs");
        let dest_compiled = format!("{STARTUP_FOLDER_QUOTED}\\{stem}.exe");

        Ok(ActionBundle::from(vec![
            StartupAction::file(src, dest_source.clone()),
            StartupAction::Powershell {
                inline: vec![
                    format!(
                        "Add-Type -outputtype consoleapplication -outputassembly {dest_compiled} -Path {dest_source}"
                    ),
                    format!("Remove-Item {STARTUP_FOLDER_QUOTED}\\{stem}.pdb"),
                ],
            },
        ]))
    }

    /// Drop a file into the guest's Startup folder under its own name.
    pub fn upload_onstartup(&self, src: &str) -> Result<ActionBundle, AppError> {
        let src = expand_user(src);
        let path = Path::new(&src);
        if !path.exists() {
            return Err(AppError::MissingSourceFile(src));
        }
        let basename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| src.clone());

        Ok(ActionBundle::from(vec![StartupAction::file(
            src.clone(),
            format!("{STARTUP_FOLDER}\\{basename}"),
        )]))
    }

    /// Upload a program under a random name and run it during
    /// provisioning.
    pub fn upload_execute(&self, src: &str, args: &str) -> Result<ActionBundle, AppError> {
        let src = expand_user(src);
        let path = Path::new(&src);
        if !path.exists() {
            return Err(AppError::MissingSourceFile(src));
        }

        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let dest = format!("$env:TEMP\\{}{extension}", random_string(10));

        Ok(ActionBundle::from(vec![
            StartupAction::file(src, dest.clone()),
            StartupAction::Powershell {
                inline: vec![format!("& \"{dest}\" {args}")],
            },
        ]))
    }

    /// Upload a C# source, compile it in the guest and run the result
    /// during provisioning.
    pub fn upload_compile_execute(&self, src: &str, args: &str) -> Result<ActionBundle, AppError> {
        let src = expand_user(src);
        self.check_csharp_source(&src)?;

        let stem = random_string(10);
        let dest_source = format!("$env:TEMP\\{stem}.cs");
        let dest_compiled = format!("$env:TEMP\\{stem}.exe");

        Ok(ActionBundle::from(vec![
            StartupAction::file(src, dest_source.clone()),
            StartupAction::Powershell {
                inline: vec![
                    format!(
                        "Add-Type -outputtype consoleapplication -outputassembly {dest_compiled} -Path \"{dest_source}\""
                    ),
                    format!("& \"{dest_compiled}\" {args}"),
                ],
            },
        ]))
    }

    /// Existence, extension and host-side compile check shared by all
    /// C# directives.
    fn check_csharp_source(&self, src: &str) -> Result<(), AppError> {
        let path = Path::new(src);
        if !path.exists() {
            return Err(AppError::MissingSourceFile(src.to_string()));
        }
        if path.extension().map(|ext| ext != "cs").unwrap_or(true) {
            return Err(AppError::InvalidExtension {
                path: src.to_string(),
                expected: ".cs".to_string(),
            });
        }
        match self.compiler.check(path)? {
            CheckOutcome::Passed => Ok(()),
            CheckOutcome::Unavailable => {
                println!(
                    "WARNING: PowerShell not found locally, skipping the compile check for {src}"
                );
                Ok(())
            }
        }
    }

    /// Assemble the per-profile provisioning script from the package,
    /// directory and shortcut sections. Always written, even when
    /// empty, since the builder template uploads it unconditionally.
    fn write_profile_script(&self, profile: &Profile, profile_name: &str) -> Result<(), AppError> {
        let mut script = String::new();

        if !profile.extra_choco_packages.is_empty() {
            println!("Adding Chocolatey package: {}", profile.extra_choco_packages);
            script.push_str(&format!(
                "choco install {} -y\r\n",
                profile.extra_choco_packages
            ));
        }

        for change in &profile.directory {
            match change.modtype.as_str() {
                "add" => {
                    println!("Adding directory: {}", change.dirpath);
                    script.push_str(&format!(
                        "New-Item -Path \"{}\" -Type directory\r\n",
                        change.dirpath
                    ));
                }
                "delete" => {
                    println!("Removing directory: {}", change.dirpath);
                    script.push_str(&format!("Remove-Item -Path \"{}\"\r\n", change.dirpath));
                }
                other => {
                    println!("Directory modification type invalid: {other}");
                    println!("Valid ones are: add, delete.");
                }
            }
        }

        if !profile.shortcut.is_empty() {
            script.push_str(assets::guest_script("add-shortcut.ps1")?);
            for shortcut in &profile.shortcut {
                match &shortcut.arguments {
                    Some(arguments) => {
                        println!(
                            "Adding shortcut {}: {} with arguments {}",
                            shortcut.dest, shortcut.target, arguments
                        );
                        script.push_str(&format!(
                            "Add-Shortcut \"{}\" \"{}\" \"{}\"\r\n",
                            shortcut.target, shortcut.dest, arguments
                        ));
                    }
                    None => {
                        println!("Adding shortcut {}: {}", shortcut.dest, shortcut.target);
                        script.push_str(&format!(
                            "Add-Shortcut \"{}\" \"{}\"\r\n",
                            shortcut.target, shortcut.dest
                        ));
                    }
                }
            }
        }

        self.ctx
            .write_scratch_file(&format!("profile-{profile_name}.ps1"), &script)?;
        Ok(())
    }

    /// Write the task XML to scratch and append the upload/register
    /// tail shared by every scheduled variant.
    fn scheduler_task(
        &self,
        head: Vec<StartupAction>,
        xml_name: &str,
        xml: &str,
        task_name: &str,
    ) -> Result<ScheduledTask, AppError> {
        let xml_path = self.ctx.write_scratch_file(xml_name, xml)?;
        let xml_dest = format!("$env:TEMP/{task_name}.xml");

        let mut bundle = ActionBundle::from(head);
        bundle.push(StartupAction::file(
            xml_path.display().to_string(),
            xml_dest.clone(),
        ));
        bundle.push(StartupAction::Powershell {
            inline: vec![
                format!("Schtasks /create /ru 'System' /tn {task_name} /xml {xml_dest}"),
                format!("Remove-Item {xml_dest}"),
            ],
        });

        Ok(ScheduledTask {
            task_name: task_name.to_string(),
            bundle,
        })
    }

    fn materialize_script(&self, name: &str) -> Result<PathBuf, AppError> {
        self.ctx.write_scratch_file(name, assets::guest_script(name)?)
    }
}

fn effective_task_name(task_name: Option<&str>) -> String {
    match task_name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => random_string(10),
    }
}

fn now_stamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// UTF-16LE then base64, the encoding `powershell -EncodedCommand`
/// expects.
fn encode_payload(content: &str) -> String {
    let utf16: Vec<u8> = content
        .encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect();
    STANDARD.encode(utf16)
}

fn read_source(src: &str) -> Result<String, AppError> {
    let path = Path::new(src);
    if !path.exists() {
        return Err(AppError::MissingSourceFile(src.to_string()));
    }
    Ok(fs::read_to_string(path)?)
}
