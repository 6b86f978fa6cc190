//! Emission of the build plan into the scratch directory: the
//! rendered builder template, the unattended-install answer file, the
//! builder variable file and the merged plan record itself.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::app::BuildContext;
use crate::domain::{AppError, Configuration};
use crate::services::{assets, templates};

/// Paths of everything `emit` wrote.
#[derive(Debug, Clone)]
pub struct EmittedPlan {
    pub template_path: PathBuf,
    pub var_file: PathBuf,
    pub autounattend_path: PathBuf,
    pub plan_path: PathBuf,
}

/// The builder chokes on backslashes in its variable values on
/// Windows hosts, so every path that enters the plan goes through
/// here.
pub fn forward_slashes(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

pub struct PlanEmitter<'a> {
    ctx: &'a BuildContext,
}

impl<'a> PlanEmitter<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        Self { ctx }
    }

    /// Render and write all build artifacts. `user_config` is the
    /// loaded (not merged) user configuration; the builder receives it
    /// verbatim as its variable file.
    pub fn emit(
        &self,
        config: &mut Configuration,
        template: &str,
        user_config: &Map<String, Value>,
    ) -> Result<EmittedPlan, AppError> {
        let source = assets::builder_template(template)
            .ok_or_else(|| AppError::UnknownTemplate(template.to_string()))?;

        // The template references its guest scripts by path, so the
        // embedded asset tree gets a real on-disk copy first.
        let assets_dir = self.ctx.scratch_path("assets");
        assets::materialize(&assets_dir)?;
        self.ctx.track(assets_dir.clone());
        config.dir = Some(forward_slashes(&assets_dir));

        normalize_paths(config);

        let template_file = format!("{template}.json");
        let rendered = templates::render(&template_file, source, &*config)?;
        let template_path = self.ctx.write_scratch_file(&template_file, &rendered)?;

        let template_config: Map<String, Value> =
            serde_json::from_str(&rendered).map_err(|err| AppError::TemplateRender {
                name: template_file.clone(),
                details: format!("rendered template is not valid JSON: {err}"),
            })?;
        merge_template(config, template_config).map_err(|err| AppError::TemplateRender {
            name: template_file.clone(),
            details: err.to_string(),
        })?;

        let os_type = guest_os_type(config, &template_file)?;
        let autounattend = templates::render(
            "Autounattend.xml",
            assets::autounattend(&os_type)?,
            &*config,
        )?;
        let autounattend_path = self.ctx.write_scratch_file("Autounattend.xml", &autounattend)?;

        let var_file = self.ctx.write_scratch_file(
            "packer_var_file.json",
            &serde_json::to_string(user_config)
                .map_err(|err| AppError::config_error(err.to_string()))?,
        )?;

        let plan_path = self.ctx.write_scratch_file(
            "plan.json",
            &serde_json::to_string_pretty(&*config)
                .map_err(|err| AppError::config_error(err.to_string()))?,
        )?;

        if self.ctx.debug() {
            println!("Generated builder template: {}", template_path.display());
            println!("Build plan written to: {}", plan_path.display());
        }

        Ok(EmittedPlan {
            template_path,
            var_file,
            autounattend_path,
            plan_path,
        })
    }
}

fn normalize_paths(config: &mut Configuration) {
    config.iso_dir = config.iso_dir.replace('\\', "/");
    for field in [
        &mut config.tools_path,
        &mut config.cache_dir,
        &mut config.config_dir,
        &mut config.dir,
    ] {
        if let Some(value) = field.take() {
            *field = Some(value.replace('\\', "/"));
        }
    }
}

/// Merge the rendered template's top-level keys over the
/// configuration, the template winning. Goes through a JSON value
/// round trip so template keys that shadow typed fields replace them
/// instead of duplicating them.
fn merge_template(
    config: &mut Configuration,
    template_config: Map<String, Value>,
) -> Result<(), serde_json::Error> {
    let mut merged = match serde_json::to_value(&*config)? {
        Value::Object(map) => map,
        _ => unreachable!("configurations serialize to objects"),
    };
    for (key, value) in template_config {
        merged.insert(key, value);
    }
    *config = serde_json::from_value(Value::Object(merged))?;
    Ok(())
}

/// Guest OS type from the merged template, used to pick the answer
/// file. Older vSphere releases report Windows 10 as windows8, so
/// those values are mapped forward.
fn guest_os_type(config: &Configuration, template_file: &str) -> Result<String, AppError> {
    let os_type = config
        .extra
        .get("builders")
        .and_then(Value::as_array)
        .and_then(|builders| builders.first())
        .and_then(|builder| builder.get("guest_os_type"))
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::TemplateRender {
            name: template_file.to_string(),
            details: "template defines no builders[0].guest_os_type".to_string(),
        })?;

    let os_type = os_type.to_lowercase();
    if config.hypervisor == "vsphere" {
        return Ok(match os_type.as_str() {
            "windows8" => "windows10".to_string(),
            "windows8-64" => "windows10_64".to_string(),
            _ => os_type,
        });
    }
    Ok(os_type)
}
