//! Template rendering for builder templates, answer files, guest
//! scripts and Vagrantfiles. One environment configuration is used
//! everywhere: strict undefined lookups so a typo'd setting fails the
//! build instead of rendering as empty text.

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

use crate::domain::AppError;

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env
}

/// Render `source` with `context`. `name` is only for error messages.
pub fn render<C: Serialize>(name: &str, source: &str, context: &C) -> Result<String, AppError> {
    let env = environment();
    env.render_str(source, context)
        .map_err(|err| AppError::TemplateRender {
            name: name.to_string(),
            details: err.to_string(),
        })
}
