//! Guest-side provisioning actions. These are the only two primitives
//! the image builder understands: push a file into the guest, or run
//! PowerShell inside it. Everything a profile asks for is compiled
//! down to ordered bundles of these.

use serde::{Deserialize, Serialize};

/// One guest-side step, serialized in the exact shape the image
/// builder consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StartupAction {
    /// Copy a host file into the guest.
    File { source: String, destination: String },
    /// Run PowerShell lines inside the guest.
    Powershell { inline: Vec<String> },
}

impl StartupAction {
    pub fn file<S: Into<String>, D: Into<String>>(source: S, destination: D) -> Self {
        StartupAction::File {
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn powershell<S: Into<String>>(line: S) -> Self {
        StartupAction::Powershell {
            inline: vec![line.into()],
        }
    }
}

/// Ordered group of actions that belong together, e.g. "upload this
/// XML, then register it with the task scheduler". Bundles keep their
/// internal order when the plan is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionBundle(pub Vec<StartupAction>);

impl ActionBundle {
    pub fn new() -> Self {
        ActionBundle(Vec::new())
    }

    pub fn push(&mut self, action: StartupAction) {
        self.0.push(action);
    }

    pub fn actions(&self) -> &[StartupAction] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<StartupAction>> for ActionBundle {
    fn from(actions: Vec<StartupAction>) -> Self {
        ActionBundle(actions)
    }
}

/// A compiled on-startup task: the scheduler registration bundle plus
/// the task name it registers under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub task_name: String,
    pub bundle: ActionBundle,
}
