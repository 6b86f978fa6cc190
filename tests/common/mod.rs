//! Shared testing utilities for the boxforge CLI tests.
//!
//! Each test gets an isolated environment: private config and cache
//! homes wired through the XDG variables, a scratch analysis
//! directory for `spin`, and stub `VBoxManage`, `packer` and `pwsh`
//! executables on a prepended PATH. The stubs append their argv to
//! log files under a state directory so tests can assert on exactly
//! what was invoked.

use assert_cmd::Command;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Testing harness providing an isolated environment for CLI
/// exercises.
#[allow(dead_code)]
pub struct TestContext {
    root: TempDir,
    work_dir: PathBuf,
    bin_dir: PathBuf,
    state_dir: PathBuf,
    machine_folder: PathBuf,
    path: String,
}

#[allow(dead_code)]
impl TestContext {
    /// Create a new isolated environment.
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory for tests");
        let work_dir = root.path().join("analysis");
        let bin_dir = root.path().join("bin");
        let state_dir = root.path().join("state");
        let machine_folder = root.path().join("machines");
        for dir in [&work_dir, &bin_dir, &state_dir, &machine_folder] {
            fs::create_dir_all(dir).expect("Failed to create test directory");
        }

        // Stubs go first on PATH; the rest stays so the stub scripts
        // can reach the usual shell tools.
        let path = match env::var("PATH") {
            Ok(current) => format!("{}:{}", bin_dir.display(), current),
            Err(_) => bin_dir.display().to_string(),
        };

        Self { root, work_dir, bin_dir, state_dir, machine_folder, path }
    }

    /// Build a command for invoking the compiled `boxforge` binary
    /// inside the isolated environment.
    pub fn cli(&self) -> Command {
        let mut cmd =
            Command::cargo_bin("boxforge").expect("Failed to locate boxforge binary");
        cmd.current_dir(&self.work_dir)
            .env("HOME", self.root.path())
            .env("XDG_CONFIG_HOME", self.root.path().join("config-home"))
            .env("XDG_CACHE_HOME", self.root.path().join("cache-home"))
            .env("PATH", &self.path);
        cmd
    }

    /// Directory `spin` runs in and writes its Vagrantfile to.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.path().join("config-home/boxforge")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.path().join("cache-home/boxforge")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("config.js")
    }

    pub fn profile_file(&self, name: &str) -> PathBuf {
        self.config_dir().join("profiles").join(format!("{name}.js"))
    }

    /// The machine folder the VBoxManage stub reports; VM build
    /// directories are created under it.
    pub fn machine_folder(&self) -> &Path {
        &self.machine_folder
    }

    pub fn vm_dir(&self, vm_name: &str) -> PathBuf {
        self.machine_folder.join(vm_name)
    }

    /// Write a config.js into the isolated config home.
    pub fn seed_config(&self, contents: &str) {
        fs::create_dir_all(self.config_dir()).expect("Failed to create config dir");
        fs::write(self.config_file(), contents).expect("Failed to write config.js");
    }

    /// Write a named profile into the isolated config home.
    pub fn seed_profile(&self, name: &str, contents: &str) {
        let path = self.profile_file(name);
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create profiles dir");
        fs::write(&path, contents).expect("Failed to write profile");
    }

    /// Drop a host-side fixture file (startup script, sample) under
    /// the temp root and return its absolute path.
    pub fn write_fixture(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.root.path().join("fixtures").join(name);
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create fixtures dir");
        fs::write(&path, contents).expect("Failed to write fixture");
        path
    }

    /// Install a VBoxManage stub that serves the given VM inventory,
    /// reports the harness machine folder and persists descriptions
    /// written through `modifyvm` so `showvminfo` can return them.
    pub fn install_vboxmanage(&self, registered: &[&str]) {
        fs::write(self.state_dir.join("vms.txt"), "").expect("Failed to seed VM inventory");
        for name in registered {
            self.register_vm(name);
        }

        let script = format!(
            r#"#!/bin/sh
state="{state}"
echo "$@" >> "$state/vbox.log"
case "$1" in
list)
    if [ "$2" = "vms" ]; then
        cat "$state/vms.txt"
    elif [ "$2" = "systemproperties" ]; then
        echo "Default machine folder:          {machines}"
    fi
    ;;
modifyvm)
    printf '%s' "$4" > "$state/description-$2.json"
    ;;
showvminfo)
    echo "Name:            $2"
    if [ -f "$state/description-$2.json" ]; then
        printf 'Description:     '
        cat "$state/description-$2.json"
        echo ''
    fi
    ;;
esac
exit 0
"#,
            state = self.state_dir.display(),
            machines = self.machine_folder.display(),
        );
        self.install_stub("VBoxManage", &script);
    }

    /// Add a VM to the stub's inventory, as a completed packer run
    /// would have.
    pub fn register_vm(&self, name: &str) {
        let inventory = self.state_dir.join("vms.txt");
        let mut lines = fs::read_to_string(&inventory).unwrap_or_default();
        let serial = lines.lines().count();
        lines.push_str(&format!(
            "\"{name}\" {{0b0b0b0b-0000-4000-8000-{serial:012}}}\n"
        ));
        fs::write(&inventory, lines).expect("Failed to write VM inventory");
    }

    /// Install a packer stub that records its argv and succeeds.
    pub fn install_packer(&self) {
        let script = format!(
            "#!/bin/sh\necho \"$@\" >> \"{}/packer.log\"\nexit 0\n",
            self.state_dir.display()
        );
        self.install_stub("packer", &script);
    }

    /// Install a pwsh stub whose `Add-Type` check always passes.
    pub fn install_pwsh(&self) {
        self.install_stub("pwsh", "#!/bin/sh\nexit 0\n");
    }

    /// Install a pwsh stub that rejects every source it is given.
    pub fn install_failing_pwsh(&self) {
        self.install_stub("pwsh", "#!/bin/sh\necho 'error CS1002: ; expected'\nexit 1\n");
    }

    fn install_stub(&self, name: &str, script: &str) {
        let path = self.bin_dir.join(name);
        fs::write(&path, script).expect("Failed to write stub");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .expect("Failed to mark stub executable");
        }
    }

    /// Everything the VBoxManage stub has been invoked with, one call
    /// per line.
    pub fn vbox_log(&self) -> String {
        fs::read_to_string(self.state_dir.join("vbox.log")).unwrap_or_default()
    }

    /// Everything the packer stub has been invoked with.
    pub fn packer_log(&self) -> String {
        fs::read_to_string(self.state_dir.join("packer.log")).unwrap_or_default()
    }

    /// The description JSON `modifyvm --description` stored for a VM.
    pub fn stored_description(&self, vm_name: &str) -> Option<String> {
        fs::read_to_string(self.state_dir.join(format!("description-{vm_name}.json"))).ok()
    }
}
