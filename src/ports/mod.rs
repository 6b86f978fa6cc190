mod builder;
mod compiler;
mod hypervisor;

pub use builder::{BuildRequest, ImageBuilder};
pub use compiler::{CheckOutcome, ScriptCompiler};
pub use hypervisor::{Hypervisor, VmMetadata};
