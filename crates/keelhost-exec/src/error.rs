//! Error types for keelhost-exec

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while running a command on the target host
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// Failed to connect to remote host
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Command ran but exited with a non-zero status
    #[error("exit status {status}: {output}")]
    CommandFailed {
        /// Exit status code
        status: i32,
        /// Combined stdout/stderr of the failed command
        output: String,
    },

    /// Command timed out
    #[error("command timed out after {timeout:?}")]
    Timeout {
        /// Timeout duration that was exceeded
        timeout: Duration,
    },

    /// SSH key error
    #[error("SSH key error: {0}")]
    SshKeyError(String),

    /// Process spawn error
    #[error("failed to spawn process: {0}")]
    SpawnError(String),

    /// I/O error on the channel, including a dropped connection
    #[error("I/O error: {0}")]
    IoError(String),

    /// Connection not established
    #[error("not connected")]
    NotConnected,

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    ConfigError(String),
}

impl ExecError {
    /// Exit status of the remote command, if it ran to completion
    #[must_use]
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            ExecError::CommandFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status_only_for_command_failures() {
        let failed = ExecError::CommandFailed {
            status: 77,
            output: String::new(),
        };
        assert_eq!(failed.exit_status(), Some(77));
        assert_eq!(ExecError::NotConnected.exit_status(), None);
        assert_eq!(
            ExecError::IoError("channel closed".to_string()).exit_status(),
            None
        );
    }

    #[test]
    fn test_display_includes_status() {
        let failed = ExecError::CommandFailed {
            status: 1,
            output: "unit not found".to_string(),
        };
        assert_eq!(failed.to_string(), "exit status 1: unit not found");
    }
}
