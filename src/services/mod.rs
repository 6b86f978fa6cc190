pub mod assets;
mod emitter;
mod packer;
mod pwsh;
mod startup;
pub mod templates;
mod vbox;

pub use emitter::{EmittedPlan, PlanEmitter, forward_slashes};
pub use packer::PackerBuilder;
pub use pwsh::PowershellCompiler;
pub use startup::StartupCompiler;
pub use vbox::VBoxManageHypervisor;
