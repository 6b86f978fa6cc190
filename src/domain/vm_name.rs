//! VM naming. Every build gets a name that is unique within the
//! hypervisor inventory so repeated builds of the same template never
//! clobber a registered machine.

use std::collections::HashSet;

use crate::domain::identity;

/// Append the lowest numeric suffix that makes `base` unique within
/// `existing`. Counting starts at zero, so even a collision-free base
/// comes out as `base_0`.
pub fn resolve_vm_name(base: &str, existing: &HashSet<String>) -> String {
    let mut i = 0u32;
    loop {
        let candidate = format!("{base}_{i}");
        if !existing.contains(&candidate) {
            return candidate;
        }
        i += 1;
    }
}

/// Name used when no hypervisor inventory is available to check
/// against. A random suffix stands in for the collision counter.
pub fn fallback_vm_name(template: &str) -> String {
    format!("{}_{}", template, identity::random_string(6))
}
