pub mod build;
pub mod creds;
pub mod list;
pub mod spin;

use std::path::PathBuf;

/// Options every subcommand accepts.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Config file override; the per-user config.js otherwise.
    pub config: Option<PathBuf>,
    /// Profile override; the config's own profile setting otherwise.
    pub profile: Option<String>,
    /// Keep intermediate build files and print extra detail.
    pub debug: bool,
}
