//! Layering of the three configuration sources. Defaults sit at the
//! bottom, the user config overrides them, and the profile's
//! `overwrite` map wins over both. The merged map is then checked and
//! lifted into the typed [`Configuration`].

use std::path::Path;

use serde_json::{Map, Value};

use crate::domain::config::model::{Configuration, TOGGLE_KEYS};
use crate::domain::error::AppError;

/// Template name minus its final underscore segment. The ISO settings
/// in the config are keyed on this, so `win10_64_analyst` looks up
/// `win10_64_iso_name`.
pub fn template_prefix(template: &str) -> &str {
    match template.rsplit_once('_') {
        Some((prefix, _)) => prefix,
        None => template,
    }
}

/// Merge the three layers, later layers winning key by key. Profiles
/// may overwrite anything except the hypervisor: switching hypervisors
/// mid-profile would silently invalidate the whole plan, so that one
/// is rejected up front.
pub fn merge_layers(
    defaults: Map<String, Value>,
    user: Map<String, Value>,
    overwrite: Option<&Map<String, Value>>,
) -> Result<Map<String, Value>, AppError> {
    if let Some(overwrite) = overwrite {
        if overwrite.contains_key("hypervisor") {
            return Err(AppError::ProfileHypervisorOverride);
        }
    }

    let mut merged = defaults;
    for (key, value) in user {
        merged.insert(key, value);
    }
    if let Some(overwrite) = overwrite {
        for (key, value) in overwrite {
            merged.insert(key.clone(), value.clone());
        }
    }

    Ok(merged)
}

/// Lift a merged map into the typed configuration. Toggle keys are
/// checked first so a bad value reports as exactly that instead of a
/// generic deserialization failure.
pub fn into_configuration(
    merged: Map<String, Value>,
    origin: &Path,
) -> Result<Configuration, AppError> {
    for key in TOGGLE_KEYS {
        if let Some(value) = merged.get(*key) {
            let ok = matches!(value, Value::String(s) if s == "true" || s == "false");
            if !ok {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                return Err(AppError::InvalidToggle {
                    field: key.to_string(),
                    value: rendered,
                });
            }
        }
    }

    serde_json::from_value(Value::Object(merged)).map_err(|err| {
        AppError::Configuration(format!(
            "Invalid configuration in {}: {}",
            origin.display(),
            err
        ))
    })
}

/// Full resolution: merge, typecheck, validate. `origin` names the
/// config file for error messages.
pub fn resolve(
    defaults: Map<String, Value>,
    user: Map<String, Value>,
    overwrite: Option<&Map<String, Value>>,
    template: &str,
    origin: &Path,
) -> Result<Configuration, AppError> {
    let merged = merge_layers(defaults, user, overwrite)?;
    let config = into_configuration(merged, origin)?;
    config.validate(template_prefix(template), origin)?;
    Ok(config)
}
