use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::domain::AppError;
use crate::ports::{Hypervisor, VmMetadata};

/// In-memory hypervisor with a fixed inventory. Metadata writes are
/// recorded so tests can assert on them.
pub struct FakeHypervisor {
    names: HashSet<String>,
    machine_folder: PathBuf,
    metadata: Mutex<HashMap<String, VmMetadata>>,
}

impl FakeHypervisor {
    pub fn new(names: &[&str], machine_folder: PathBuf) -> Self {
        Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            machine_folder,
            metadata: Mutex::new(HashMap::new()),
        }
    }

    pub fn stored_metadata(&self, vm_name: &str) -> Option<VmMetadata> {
        self.metadata.lock().unwrap().get(vm_name).cloned()
    }
}

impl Hypervisor for FakeHypervisor {
    fn vm_names(&self) -> Result<HashSet<String>, AppError> {
        Ok(self.names.clone())
    }

    fn default_machine_folder(&self) -> Result<PathBuf, AppError> {
        Ok(self.machine_folder.clone())
    }

    fn vm_metadata(&self, vm_name: &str) -> Result<VmMetadata, AppError> {
        self.metadata
            .lock()
            .unwrap()
            .get(vm_name)
            .cloned()
            .ok_or_else(|| AppError::ExternalProcessFailed {
                command: format!("VBoxManage showvminfo {vm_name}"),
                details: "No stored credentials found in the VM description".to_string(),
            })
    }

    fn store_vm_metadata(&self, vm_name: &str, metadata: &VmMetadata) -> Result<(), AppError> {
        self.metadata
            .lock()
            .unwrap()
            .insert(vm_name.to_string(), metadata.clone());
        Ok(())
    }
}
