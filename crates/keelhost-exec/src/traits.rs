//! Remote executor trait

use async_trait::async_trait;

use crate::error::ExecError;
use crate::result::CommandResult;

/// Runs a shell command on the host being provisioned.
///
/// `run` reports a non-zero exit status as data; `run_checked` turns it into
/// an error so callers can use `?` and inspect [`ExecError::exit_status`].
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Run a command and wait for it to finish
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError>;

    /// Run a command, failing on a non-zero exit status
    ///
    /// Returns the combined stdout/stderr on success.
    async fn run_checked(&self, cmd: &str) -> Result<String, ExecError> {
        self.run(cmd).await?.into_checked()
    }

    /// Short name used in logs
    fn executor_type(&self) -> &'static str;
}
