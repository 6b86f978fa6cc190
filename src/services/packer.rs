//! Packer adapter. Runs the external image builder in the build's
//! scratch directory with its cache and temp files redirected there,
//! streaming build output straight to the terminal.

use std::env;
use std::io;
use std::process::Command;
use std::time::Instant;

use crate::domain::AppError;
use crate::ports::{BuildRequest, ImageBuilder};

/// Some distributions package the binary as `packer-io` to avoid a
/// name clash; prefer that one when present.
const CANDIDATES: &[&str] = &["packer-io", "packer"];

#[derive(Debug, Clone, Default)]
pub struct PackerBuilder;

impl PackerBuilder {
    pub fn new() -> Self {
        Self
    }

    fn spawn(&self, binary: &str, request: &BuildRequest<'_>) -> io::Result<std::process::ExitStatus> {
        let mut command = Command::new(binary);
        command.arg("build");
        command.arg(format!("-var-file={}", request.var_file.display()));

        if request.debug {
            command.arg("-on-error=abort");
        }
        if request.force {
            command.arg("-force");
        }
        command.arg(request.template_path);

        let cache_dir = env::var_os("PACKER_CACHE_DIR")
            .unwrap_or_else(|| request.working_dir.as_os_str().to_os_string());
        command.env("PACKER_CACHE_DIR", cache_dir);
        command.env("TMPDIR", request.working_dir);
        if request.debug {
            command.env("PACKER_LOG", "1");
            command.env("PACKER_LOG_PATH", request.working_dir.join("packerlog.txt"));
        }

        command.current_dir(request.working_dir);
        command.status()
    }
}

impl ImageBuilder for PackerBuilder {
    fn build(&self, request: &BuildRequest<'_>) -> Result<(), AppError> {
        println!("Starting packer to generate the VM");
        println!("----------------------------------");
        let start = Instant::now();

        let mut status = None;
        for binary in CANDIDATES {
            match self.spawn(binary, request) {
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(AppError::Io(err)),
                Ok(exit) => {
                    status = Some(exit);
                    break;
                }
            }
        }

        let Some(status) = status else {
            return Err(AppError::ExternalToolNotFound("packer".to_string()));
        };

        println!("----------------------------------");
        println!(
            "packer completed in {:.2} minutes",
            start.elapsed().as_secs_f64() / 60.0
        );

        if !status.success() {
            return Err(AppError::ExternalProcessFailed {
                command: format!("packer build {}", request.template_path.display()),
                details: status.to_string(),
            });
        }

        Ok(())
    }
}
