use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::AppError;

/// Credentials and network identity stored with a built VM, recovered
/// later by `creds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmMetadata {
    pub username: String,
    pub password: String,
    pub computername: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_ip: Option<String>,
}

/// The hypervisor hosting built images.
pub trait Hypervisor {
    /// Names of every registered VM.
    fn vm_names(&self) -> Result<HashSet<String>, AppError>;

    /// Directory new VMs are created under.
    fn default_machine_folder(&self) -> Result<PathBuf, AppError>;

    /// Recover the metadata stored with a VM.
    fn vm_metadata(&self, vm_name: &str) -> Result<VmMetadata, AppError>;

    /// Store metadata with a VM so it survives with the image.
    fn store_vm_metadata(&self, vm_name: &str, metadata: &VmMetadata) -> Result<(), AppError>;
}
