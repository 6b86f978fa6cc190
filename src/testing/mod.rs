mod fake_builder;
mod fake_compiler;
mod fake_hypervisor;

#[allow(unused_imports)]
pub use fake_builder::FakeBuilder;
#[allow(unused_imports)]
pub use fake_compiler::StaticCompiler;
#[allow(unused_imports)]
pub use fake_hypervisor::FakeHypervisor;
