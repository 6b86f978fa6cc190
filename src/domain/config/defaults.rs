//! Baseline settings layered under every user configuration. Guest
//! credentials and MAC addresses are randomized per invocation so
//! images built from an untouched config still come out unique.

use std::path::Path;

use serde_json::{Map, Value, json};

use crate::domain::identity::{random_mac, random_string};

/// The full default settings table. Every key a template may look up
/// has a value after this layer, so rendering never trips over a hole
/// left by a sparse user config.
pub fn default_settings(iso_dir: &Path) -> Map<String, Value> {
    let mut defaults = Map::new();
    let mut set = |key: &str, value: Value| {
        defaults.insert(key.to_string(), value);
    };

    set("hypervisor", json!("virtualbox"));
    set("username", json!(random_string(8)));
    set("password", json!(random_string(14)));
    set("computername", json!(random_string(8)));
    set("iso_dir", json!(iso_dir.display().to_string()));
    set("mac_address_nat", json!(random_mac()));
    set("mac_address_hostonly", json!(random_mac()));
    set("cpus", json!("2"));
    set("memory", json!("4096"));
    set("vram", json!("128"));
    set("skip_export", json!("true"));
    set("keep_registered", json!("true"));
    set("hide_vm_artifacts", json!("true"));
    set("guestadditions", json!("true"));
    set("windows_firewall", json!("true"));
    set("windows_updates", json!("false"));
    set("windows_defender", json!("false"));
    set("windows_testsigning", json!("false"));
    // 120 GB
    set("disk_size", json!("114441"));
    set("choco_packages", json!(""));
    set("extra_choco_packages", json!(""));
    set("input_locale", json!("en-EN"));
    set("trial", json!("true"));
    set("profile", json!("default"));
    set("cleanup", json!("false"));
    set("onstartup_script", json!([]));
    set("upload_execute", json!([]));
    set("upload_compile_execute", json!([]));
    set("upload_onstartup", json!([]));
    set("screen_width", json!("1600"));
    set("screen_height", json!("1200"));
    set("set_static_ip", json!("false"));
    set("guest_ip", json!(""));
    set("netmask", json!(""));
    set("gateway_ip", json!(""));
    set("dnsserver_ip", json!(""));
    set("secondary_dnsserver_ip", json!(""));
    set("openssh_server", json!("false"));
    set("winrm", json!("false"));
    set("flare_vm", json!("false"));
    set("generate_random_files", json!("true"));
    set("choco_source", json!("https://chocolatey.org/api/v2"));
    set("flare_source", json!("https://www.myget.org/F/flare/api/v2"));
    set("enable_flare_source", json!("false"));

    defaults
}
