pub mod defaults;
pub mod loader;
pub mod model;
pub mod resolve;

pub use model::{Configuration, Switch, TOGGLE_KEYS};
