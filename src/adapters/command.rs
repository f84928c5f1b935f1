//! Local Command Runner
//!
//! Runs CLI tools through `tokio::process` so a cancelled run kills the
//! child instead of leaving it behind.

use crate::domain::ports::CommandRunner;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use tokio::process::Command;
use tracing::debug;

/// [`CommandRunner`] backed by real processes
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        debug!("Running {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Command {
                program: program.to_string(),
                reason: match e.kind() {
                    ErrorKind::NotFound => "executable not found in PATH".to_string(),
                    _ => e.to_string(),
                },
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Command {
                program: program.to_string(),
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
