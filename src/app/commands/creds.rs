use crate::domain::AppError;
use crate::ports::{Hypervisor, VmMetadata};

/// Fetch the credentials stored with a built VM. Unknown names are
/// rejected before the hypervisor is asked for details.
pub fn execute(vm_name: &str, hypervisor: &impl Hypervisor) -> Result<VmMetadata, AppError> {
    let names = hypervisor.vm_names()?;
    if !names.contains(vm_name) {
        return Err(AppError::UnknownVm(vm_name.to_string()));
    }
    hypervisor.vm_metadata(vm_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHypervisor;
    use std::path::PathBuf;

    #[test]
    fn stored_credentials_come_back() {
        let hypervisor = FakeHypervisor::new(&["lab_0"], PathBuf::from("/vms"));
        let metadata = VmMetadata {
            username: "analyst".to_string(),
            password: "hunter2hunter2".to_string(),
            computername: "LAB0".to_string(),
            static_ip: None,
        };
        hypervisor.store_vm_metadata("lab_0", &metadata).unwrap();

        assert_eq!(execute("lab_0", &hypervisor).unwrap(), metadata);
    }

    #[test]
    fn unknown_vm_is_rejected_by_name() {
        let hypervisor = FakeHypervisor::new(&["lab_0"], PathBuf::from("/vms"));
        let err = execute("lab_1", &hypervisor).unwrap_err();
        assert!(matches!(err, AppError::UnknownVm(name) if name == "lab_1"));
    }

    #[test]
    fn prefix_matches_do_not_count() {
        // "lab_0_clone" must not satisfy a lookup for "lab_0".
        let hypervisor = FakeHypervisor::new(&["lab_0_clone"], PathBuf::from("/vms"));
        assert!(matches!(
            execute("lab_0", &hypervisor).unwrap_err(),
            AppError::UnknownVm(_)
        ));
    }
}
