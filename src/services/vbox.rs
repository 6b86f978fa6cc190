//! VirtualBox adapter. Shells out to `VBoxManage` and parses the
//! fixed-format text it prints. The parsers are kept as free
//! functions over the raw output so they can be tested against
//! captured transcripts.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::process::Command;

use crate::domain::AppError;
use crate::ports::{Hypervisor, VmMetadata};

#[derive(Debug, Clone, Default)]
pub struct VBoxManageHypervisor;

impl VBoxManageHypervisor {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, args: &[&str]) -> Result<String, AppError> {
        let output = Command::new("VBoxManage").args(args).output().map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                AppError::ExternalToolNotFound("VBoxManage".to_string())
            } else {
                AppError::Io(err)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(AppError::ExternalProcessFailed {
                command: format!("VBoxManage {}", args.join(" ")),
                details: if stderr.is_empty() {
                    String::from_utf8_lossy(&output.stdout).trim().to_string()
                } else {
                    stderr
                },
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Hypervisor for VBoxManageHypervisor {
    fn vm_names(&self) -> Result<HashSet<String>, AppError> {
        let output = self.run(&["list", "vms"])?;
        parse_vm_list(&output)
    }

    fn default_machine_folder(&self) -> Result<PathBuf, AppError> {
        let output = self.run(&["list", "systemproperties"])?;
        parse_machine_folder(&output)
    }

    fn vm_metadata(&self, vm_name: &str) -> Result<VmMetadata, AppError> {
        let output = self.run(&["showvminfo", vm_name])?;
        parse_vm_metadata(vm_name, &output)
    }

    fn store_vm_metadata(&self, vm_name: &str, metadata: &VmMetadata) -> Result<(), AppError> {
        let description = serde_json::to_string(metadata)
            .map_err(|err| AppError::config_error(format!("Metadata not serializable: {err}")))?;
        self.run(&["modifyvm", vm_name, "--description", &description])?;
        Ok(())
    }
}

/// Parse `VBoxManage list vms` output. Each line reads
/// `"name" {uuid}`; the quoted name is taken verbatim.
pub fn parse_vm_list(output: &str) -> Result<HashSet<String>, AppError> {
    let mut names = HashSet::new();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let name = line
            .strip_prefix('"')
            .and_then(|rest| rest.split_once('"'))
            .map(|(name, _)| name.to_string());
        match name {
            Some(name) => {
                names.insert(name);
            }
            None => {
                return Err(AppError::ExternalProcessFailed {
                    command: "VBoxManage list vms".to_string(),
                    details: format!("Unexpected line in output, did it change? {line}"),
                });
            }
        }
    }
    Ok(names)
}

/// Parse the default machine folder out of
/// `VBoxManage list systemproperties`.
pub fn parse_machine_folder(output: &str) -> Result<PathBuf, AppError> {
    for line in output.lines() {
        if let Some(rest) = line.strip_prefix("Default machine folder:") {
            return Ok(PathBuf::from(rest.trim()));
        }
    }
    Err(AppError::ExternalProcessFailed {
        command: "VBoxManage list systemproperties".to_string(),
        details: "No 'Default machine folder' line in output, did it change?".to_string(),
    })
}

/// Recover stored metadata from `VBoxManage showvminfo` output. The
/// description is the line holding our JSON record.
pub fn parse_vm_metadata(vm_name: &str, output: &str) -> Result<VmMetadata, AppError> {
    for line in output.lines() {
        if let Some(index) = line.find("{\"username\":") {
            let raw = &line[index..];
            return serde_json::from_str(raw).map_err(|err| AppError::ExternalProcessFailed {
                command: format!("VBoxManage showvminfo {vm_name}"),
                details: format!("Stored metadata is not valid JSON: {err}"),
            });
        }
    }
    Err(AppError::ExternalProcessFailed {
        command: format!("VBoxManage showvminfo {vm_name}"),
        details: "No stored credentials found in the VM description".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vm_list_parses_quoted_names() {
        let output = "\"win10_64_analyst_default_0\" {c9e464a1-02ec-4b41-8a63-b2a329cb1e20}\n\
                      \"sandbox with spaces\" {7b2710f5-4a3e-43f0-bd8f-03dd41f3fabc}\n";
        let names = parse_vm_list(output).unwrap();
        assert!(names.contains("win10_64_analyst_default_0"));
        assert!(names.contains("sandbox with spaces"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn empty_inventory_parses_to_empty_set() {
        assert!(parse_vm_list("").unwrap().is_empty());
        assert!(parse_vm_list("\n\n").unwrap().is_empty());
    }

    #[test]
    fn malformed_vm_line_is_an_error() {
        let err = parse_vm_list("not a vm line").unwrap_err();
        assert!(matches!(err, AppError::ExternalProcessFailed { .. }));
    }

    #[test]
    fn machine_folder_line_is_found_among_noise() {
        let output = "Machine folder unrelated: /nope\n\
                      Default machine folder:          /home/analyst/VirtualBox VMs\n\
                      Hard disk folder: /elsewhere\n";
        let folder = parse_machine_folder(output).unwrap();
        assert_eq!(folder, PathBuf::from("/home/analyst/VirtualBox VMs"));
    }

    #[test]
    fn missing_machine_folder_is_an_error() {
        assert!(parse_machine_folder("VRAM: 128\n").is_err());
    }

    #[test]
    fn metadata_is_recovered_from_description_line() {
        let output = "Name:            lab_0\n\
                      Description:     {\"username\": \"oYGGcioX\", \"password\": \"pw\", \"computername\": \"HOSTA\", \"static_ip\": \"192.168.56.20\"}\n\
                      Guest OS:        Windows 10 (64-bit)\n";
        let meta = parse_vm_metadata("lab_0", output).unwrap();
        assert_eq!(meta.username, "oYGGcioX");
        assert_eq!(meta.static_ip.as_deref(), Some("192.168.56.20"));
    }

    #[test]
    fn metadata_without_static_ip_parses() {
        let output = "Description: {\"username\": \"u\", \"password\": \"p\", \"computername\": \"c\"}";
        let meta = parse_vm_metadata("lab_0", output).unwrap();
        assert_eq!(meta.static_ip, None);
    }

    #[test]
    fn vm_without_stored_metadata_is_an_error() {
        let output = "Name: lab_0\nDescription: hand-written note\n";
        let err = parse_vm_metadata("lab_0", output).unwrap_err();
        assert!(err.to_string().contains("lab_0"));
    }
}
