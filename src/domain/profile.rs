//! Provisioning profiles. A profile describes what goes into the
//! guest beyond the base image: scripts registered at startup, files
//! and programs pushed in during provisioning, Chocolatey packages,
//! filesystem tweaks and a settings overwrite map.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::error::AppError;

/// An inline PowerShell script scheduled at guest startup. The script
/// body travels base64-encoded inside the task definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InlineScript {
    pub src: String,
    #[serde(default)]
    pub task_name: Option<String>,
}

/// A PowerShell script uploaded to a fixed guest path and scheduled
/// from there.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileScript {
    pub src: String,
    pub dest: String,
    #[serde(default)]
    pub task_name: Option<String>,
}

/// A C# source compiled inside the guest and scheduled at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CsharpTask {
    pub src: String,
    pub args: String,
    #[serde(default)]
    pub task_name: Option<String>,
}

/// A directory to create or delete during provisioning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DirectoryChange {
    pub modtype: String,
    pub dirpath: String,
}

/// A desktop shortcut to plant in the guest.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShortcutSpec {
    pub dest: String,
    pub target: String,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// A file dropped into the guest's Startup folder as-is.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadSpec {
    pub src: String,
}

/// A program (or C# source) uploaded and run during provisioning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExecuteSpec {
    pub src: String,
    pub args: String,
}

/// Parsed profile document. Every section is optional in the file.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub onstartup_powershell_inline: Vec<InlineScript>,
    #[serde(default)]
    pub onstartup_powershell_file: Vec<FileScript>,
    #[serde(default)]
    pub onstartup_csharp: Vec<CsharpTask>,
    #[serde(default)]
    pub extra_choco_packages: String,
    #[serde(default)]
    pub directory: Vec<DirectoryChange>,
    #[serde(default)]
    pub shortcut: Vec<ShortcutSpec>,
    #[serde(default)]
    pub upload_onstartup: Vec<UploadSpec>,
    #[serde(default)]
    pub upload_execute: Vec<ExecuteSpec>,
    #[serde(default)]
    pub upload_compile_execute: Vec<ExecuteSpec>,
    #[serde(default)]
    pub overwrite: Map<String, Value>,
}

/// One profile directive, borrowed from the profile it lives in. The
/// variants carry exactly what their compilation step needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Directive<'a> {
    PowershellInline(&'a InlineScript),
    PowershellFile(&'a FileScript),
    Csharp(&'a CsharpTask),
    UploadOnstartup(&'a UploadSpec),
    UploadExecute(&'a ExecuteSpec),
    UploadCompileExecute(&'a ExecuteSpec),
}

impl Profile {
    /// Parse a profile from a comment-stripped JSON object. Shape
    /// errors (missing `dest`, wrong types) are fatal and name the
    /// offending field.
    pub fn parse(document: Map<String, Value>, origin: &Path) -> Result<Profile, AppError> {
        serde_json::from_value(Value::Object(document)).map_err(|err| {
            AppError::Configuration(format!("Invalid profile {}: {}", origin.display(), err))
        })
    }

    /// Directives that compile into scheduled startup tasks, in the
    /// order they are applied.
    pub fn scheduled_directives(&self) -> impl Iterator<Item = Directive<'_>> {
        self.onstartup_powershell_inline
            .iter()
            .map(Directive::PowershellInline)
            .chain(
                self.onstartup_powershell_file
                    .iter()
                    .map(Directive::PowershellFile),
            )
            .chain(self.onstartup_csharp.iter().map(Directive::Csharp))
    }

    /// Directives that compile into provisioning-time uploads, in the
    /// order they are applied.
    pub fn upload_directives(&self) -> impl Iterator<Item = Directive<'_>> {
        self.upload_onstartup
            .iter()
            .map(Directive::UploadOnstartup)
            .chain(self.upload_execute.iter().map(Directive::UploadExecute))
            .chain(
                self.upload_compile_execute
                    .iter()
                    .map(Directive::UploadCompileExecute),
            )
    }
}
