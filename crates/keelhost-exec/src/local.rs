//! Local command execution using `tokio::process`
//!
//! Used when the machine being provisioned is the one keelhost runs on.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::error::ExecError;
use crate::result::CommandResult;
use crate::traits::RemoteExecutor;

/// Local command executor
#[derive(Debug, Clone, Default)]
pub struct LocalExecutor;

impl LocalExecutor {
    /// Create a new local executor
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RemoteExecutor for LocalExecutor {
    #[instrument(skip(self), level = "debug")]
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        // Go through sh so pipes and redirections behave as they do over SSH
        let output = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExecError::SpawnError(e.to_string()))?
            .wait_with_output()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        let result = CommandResult {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: start.elapsed(),
        };

        if result.success() {
            debug!(command = %cmd, duration = ?result.duration, "command completed");
        } else {
            warn!(command = %cmd, status = result.status, "command exited non-zero");
        }

        Ok(result)
    }

    fn executor_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_success() {
        let executor = LocalExecutor::new();
        let result = executor.run("echo hello").await.unwrap();

        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_failure_reports_status() {
        let executor = LocalExecutor::new();
        let result = executor.run("exit 77").await.unwrap();

        assert!(!result.success());
        assert_eq!(result.status, 77);
    }

    #[tokio::test]
    async fn test_run_checked_maps_status_to_error() {
        let executor = LocalExecutor::new();
        let err = executor
            .run_checked("echo nope >&2; exit 3")
            .await
            .unwrap_err();

        assert_eq!(err.exit_status(), Some(3));
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_run_checked_returns_combined_output() {
        let executor = LocalExecutor::new();
        let output = executor.run_checked("echo out; echo err >&2").await.unwrap();

        assert!(output.contains("out"));
        assert!(output.contains("err"));
    }
}
