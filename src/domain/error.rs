use std::io;

use thiserror::Error;

/// Library-wide error type for boxforge operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Configuration or environment issue.
    #[error("{0}")]
    Configuration(String),

    /// Config or profile file failed to parse after comment stripping.
    #[error("Failed to parse {path}: {details} (minified copy saved to {diagnostic})")]
    MalformedConfig {
        path: String,
        details: String,
        diagnostic: String,
    },

    /// A required setting is absent from the merged configuration.
    #[error("{field} is required. Please add it to {path}")]
    MissingRequiredField { field: String, path: String },

    /// set_static_ip is enabled but the address settings are not all filled in.
    #[error("Configuration error. If set_static_ip is enabled, guest_ip, gateway_ip and netmask must be set")]
    IncompleteNetworkConfig,

    /// Two settings that cannot both be enabled are both enabled.
    #[error("Configuration error. {first} and {second} cannot both be enabled")]
    ConflictingSettings { first: String, second: String },

    /// A profile tried to overwrite the hypervisor setting.
    #[error("Profiles are not allowed to overwrite the hypervisor setting")]
    ProfileHypervisorOverride,

    /// A file referenced by a profile directive does not exist.
    #[error("Source file not found: {0}")]
    MissingSourceFile(String),

    /// A profile directive referenced a file of the wrong type.
    #[error("{path} is not a {expected} file")]
    InvalidExtension { path: String, expected: String },

    /// The host-side compilation check of a C# source rejected it.
    #[error("Compilation check failed for {path}:\n{output}")]
    CompileCheckFailed { path: String, output: String },

    /// An encoded scheduled-task payload exceeds what the task scheduler accepts.
    #[error("Encoded startup payload for {path} is {size} characters, over the {limit} limit")]
    PayloadTooLarge {
        path: String,
        size: usize,
        limit: usize,
    },

    /// A toggle setting holds something other than "true" or "false".
    #[error("Invalid value for {field}: expected \"true\" or \"false\", got {value}")]
    InvalidToggle { field: String, value: String },

    /// Builder template not among the embedded ones.
    #[error("Template doesn't exist: {0}")]
    UnknownTemplate(String),

    /// No registered VM carries the given name.
    #[error("No VM named {0} is registered")]
    UnknownVm(String),

    /// The per-build scratch directory already exists.
    #[error("Build directory already exists: {0}. Use --force to overwrite it")]
    BuildDirExists(String),

    /// A Vagrantfile is already present where spin would write one.
    #[error("A Vagrantfile already exists in this directory. Please move it away first")]
    VagrantfileExists,

    /// A required external tool is not installed.
    #[error("{0} not found on PATH. Please install it and try again")]
    ExternalToolNotFound(String),

    /// An external tool ran but reported failure.
    #[error("Error running '{command}': {details}")]
    ExternalProcessFailed { command: String, details: String },

    /// Template rendering failed.
    #[error("Failed to render {name}: {details}")]
    TemplateRender { name: String, details: String },
}

impl AppError {
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }
}
