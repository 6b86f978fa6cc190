use crate::services::assets;

/// Names of the embedded builder templates, sorted.
pub fn execute() -> Vec<String> {
    assets::list_builder_templates()
}
