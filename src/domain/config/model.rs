//! Typed view of a fully merged configuration. Everything the
//! pipeline consults by name is a real field; whatever else the user
//! wrote (template-prefixed ISO settings, extra template variables)
//! rides along in `extra` and is still visible to template rendering.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::domain::action::ActionBundle;
use crate::domain::error::AppError;

/// Settings that only accept the strings "true" and "false". They are
/// kept as strings on the wire so the emitted plan stays bit-for-bit
/// compatible with what the image builder templates expect.
pub const TOGGLE_KEYS: &[&str] = &[
    "skip_export",
    "keep_registered",
    "hide_vm_artifacts",
    "guestadditions",
    "windows_firewall",
    "windows_updates",
    "windows_defender",
    "windows_testsigning",
    "trial",
    "cleanup",
    "set_static_ip",
    "openssh_server",
    "winrm",
    "flare_vm",
    "generate_random_files",
    "enable_flare_source",
];

/// A strict string-boolean. Serializes as `"true"` or `"false"` and
/// refuses anything else on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Switch(bool);

impl Switch {
    pub const ON: Switch = Switch(true);
    pub const OFF: Switch = Switch(false);

    pub fn is_on(self) -> bool {
        self.0
    }

    pub fn is_off(self) -> bool {
        !self.0
    }
}

impl From<bool> for Switch {
    fn from(value: bool) -> Self {
        Switch(value)
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "true" } else { "false" })
    }
}

impl Serialize for Switch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if self.0 { "true" } else { "false" })
    }
}

impl<'de> Deserialize<'de> for Switch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "true" => Ok(Switch(true)),
            "false" => Ok(Switch(false)),
            other => Err(serde::de::Error::custom(format!(
                "expected \"true\" or \"false\", got \"{other}\""
            ))),
        }
    }
}

/// The merged configuration a build runs from. Produced by layering
/// defaults, the user config and the profile overwrite map, then
/// deserializing the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub hypervisor: String,
    pub profile: String,

    // Guest identity. Randomized by the defaults layer unless pinned.
    pub username: String,
    pub password: String,
    pub computername: String,
    pub mac_address_nat: String,
    pub mac_address_hostonly: String,

    // Virtual hardware.
    pub cpus: String,
    pub memory: String,
    pub vram: String,
    pub disk_size: String,
    pub screen_width: String,
    pub screen_height: String,

    pub iso_dir: String,
    pub input_locale: String,

    pub skip_export: Switch,
    pub keep_registered: Switch,
    pub hide_vm_artifacts: Switch,
    pub guestadditions: Switch,
    pub windows_firewall: Switch,
    pub windows_updates: Switch,
    pub windows_defender: Switch,
    pub windows_testsigning: Switch,
    pub trial: Switch,
    pub cleanup: Switch,
    pub openssh_server: Switch,
    pub winrm: Switch,
    pub flare_vm: Switch,
    pub generate_random_files: Switch,
    pub enable_flare_source: Switch,

    pub set_static_ip: Switch,
    pub guest_ip: String,
    pub netmask: String,
    pub gateway_ip: String,
    pub dnsserver_ip: String,
    pub secondary_dnsserver_ip: String,

    pub choco_packages: String,
    pub extra_choco_packages: String,
    pub choco_source: String,
    pub flare_source: String,

    // Compiled guest-side provisioning, in emission order.
    pub onstartup_script: Vec<ActionBundle>,
    pub upload_execute: Vec<ActionBundle>,
    pub upload_compile_execute: Vec<ActionBundle>,
    pub upload_onstartup: Vec<ActionBundle>,

    // Set by the pipeline, not by users (vm_name and tools_path may
    // also come from the config file).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,

    /// Everything not modeled above, e.g. `win10_64_iso_name` or the
    /// builder sections merged in from the rendered template.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Configuration {
    /// Post-merge validation. `prefix` is the template name minus its
    /// final underscore segment; the ISO settings are keyed on it.
    pub fn validate(&self, prefix: &str, origin: &Path) -> Result<(), AppError> {
        for suffix in ["iso_name", "checksum"] {
            let field = format!("{prefix}_{suffix}");
            let present = matches!(self.extra.get(&field), Some(Value::String(s)) if !s.is_empty());
            if !present {
                return Err(AppError::MissingRequiredField {
                    field,
                    path: origin.display().to_string(),
                });
            }
        }

        if self.set_static_ip.is_on()
            && (self.guest_ip.is_empty() || self.gateway_ip.is_empty() || self.netmask.is_empty())
        {
            return Err(AppError::IncompleteNetworkConfig);
        }

        if self.cleanup.is_on() && self.flare_vm.is_on() {
            return Err(AppError::ConflictingSettings {
                first: "cleanup".to_string(),
                second: "flare_vm".to_string(),
            });
        }

        Ok(())
    }
}
