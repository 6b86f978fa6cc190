pub mod commands;
pub mod dirs;
mod context;

pub use context::BuildContext;
