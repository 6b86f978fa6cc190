pub mod action;
pub mod config;
pub mod error;
pub mod identity;
pub mod profile;
pub mod vm_name;

pub use action::{ActionBundle, ScheduledTask, StartupAction};
pub use config::{Configuration, Switch};
pub use error::AppError;
pub use profile::{Directive, Profile};
