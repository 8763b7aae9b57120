//! Result types for command execution

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExecError;

/// Outcome of a command that ran to completion on the target host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Exit status code (0 for success)
    pub status: i32,
    /// stdout output
    pub stdout: String,
    /// stderr output
    pub stderr: String,
    /// Time taken to execute
    pub duration: Duration,
}

impl CommandResult {
    /// Successful result with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration: Duration::ZERO,
        }
    }

    /// Failed result with the given status and stderr
    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
            duration: Duration::ZERO,
        }
    }

    /// Check if command succeeded (exit code 0)
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Combine stdout and stderr
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Turn a non-zero exit status into [`ExecError::CommandFailed`]
    ///
    /// # Errors
    /// Returns `ExecError::CommandFailed` carrying the status and combined output
    pub fn into_checked(self) -> Result<String, ExecError> {
        if self.success() {
            Ok(self.combined_output())
        } else {
            Err(ExecError::CommandFailed {
                status: self.status,
                output: self.combined_output(),
            })
        }
    }
}

/// Connection information for SSH
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Host address
    pub host: String,
    /// Port (default 22)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Username
    pub user: String,
}

fn default_port() -> u16 {
    22
}

impl ConnectionInfo {
    /// Create new connection info on the default port
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            user: user.into(),
        }
    }

    /// Set custom port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_output() {
        let mut result = CommandResult::ok("out");
        assert_eq!(result.combined_output(), "out");

        result.stderr = "err".to_string();
        assert_eq!(result.combined_output(), "out\nerr");

        let only_err = CommandResult::failed(1, "boom");
        assert_eq!(only_err.combined_output(), "boom");
    }

    #[test]
    fn test_into_checked() {
        assert_eq!(
            CommandResult::ok("done").into_checked(),
            Ok("done".to_string())
        );

        let err = CommandResult::failed(77, "nothing to do")
            .into_checked()
            .unwrap_err();
        assert_eq!(err.exit_status(), Some(77));
    }
}
