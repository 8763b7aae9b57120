//! SSH command execution using russh

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use russh::keys::ssh_key;
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key};
use russh::{ChannelMsg, client};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::ExecError;
use crate::keys::{KeySource, ResolvedKey};
use crate::result::{CommandResult, ConnectionInfo};
use crate::traits::RemoteExecutor;

#[derive(Debug)]
struct SshClientHandler;

impl client::Handler for SshClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        // Freshly created machines have no known_hosts entry yet
        Ok(true)
    }
}

/// SSH command executor
///
/// Opens one session lazily and runs every command on its own channel.
/// Commands are never retried here; a dropped connection surfaces as
/// `ExecError::IoError` and the next command reconnects.
pub struct SshExecutor {
    conn_info: ConnectionInfo,
    key: ResolvedKey,
    /// Applied per command when set
    command_timeout: Option<Duration>,
    session: Mutex<Option<client::Handle<SshClientHandler>>>,
}

impl std::fmt::Debug for SshExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshExecutor")
            .field("conn_info", &self.conn_info)
            .field("key", &self.key)
            .field("command_timeout", &self.command_timeout)
            .finish_non_exhaustive()
    }
}

impl SshExecutor {
    /// Create a new SSH executor
    ///
    /// # Errors
    /// Returns `ExecError::SshKeyError` if key resolution fails
    pub fn new(conn_info: ConnectionInfo, key_source: &KeySource) -> Result<Self, ExecError> {
        let key = key_source
            .resolve()
            .map_err(|e| ExecError::SshKeyError(e.to_string()))?;

        Ok(Self {
            conn_info,
            key,
            command_timeout: None,
            session: Mutex::new(None),
        })
    }

    #[instrument(skip(self, slot), fields(host = %self.conn_info.host))]
    async fn connect(
        &self,
        slot: &mut Option<client::Handle<SshClientHandler>>,
    ) -> Result<(), ExecError> {
        if slot.as_ref().is_some_and(|s| !s.is_closed()) {
            return Ok(());
        }

        info!(
            port = self.conn_info.port,
            user = %self.conn_info.user,
            "connecting to SSH"
        );

        let config = Arc::new(client::Config::default());
        let mut session = client::connect(
            config,
            (self.conn_info.host.as_str(), self.conn_info.port),
            SshClientHandler,
        )
        .await
        .map_err(|e| ExecError::ConnectionFailed(e.to_string()))?;

        let key_pair = load_secret_key(self.key.path(), None)
            .map_err(|e| ExecError::SshKeyError(e.to_string()))?;

        let hash_alg = session
            .best_supported_rsa_hash()
            .await
            .ok()
            .flatten()
            .flatten();
        let auth = session
            .authenticate_publickey(
                &self.conn_info.user,
                PrivateKeyWithHashAlg::new(Arc::new(key_pair), hash_alg),
            )
            .await
            .map_err(|e| ExecError::AuthenticationFailed(e.to_string()))?;

        if !auth.success() {
            return Err(ExecError::AuthenticationFailed(format!(
                "public key rejected for {}",
                self.conn_info.user
            )));
        }

        info!("SSH connected and authenticated");
        *slot = Some(session);
        Ok(())
    }

    async fn exec(
        session: &client::Handle<SshClientHandler>,
        cmd: &str,
    ) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        let mut channel = session
            .channel_open_session()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;
        channel
            .exec(true, cmd)
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        let mut status = None;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        // Exit status may arrive after EOF, so drain until the channel closes
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => stdout.extend_from_slice(&data),
                ChannelMsg::ExtendedData { data, ext: 1 } => stderr.extend_from_slice(&data),
                ChannelMsg::ExitStatus { exit_status } => {
                    status = Some(exit_status.cast_signed());
                }
                _ => {}
            }
        }

        // No status means the peer went away mid-command
        let status = status.ok_or_else(|| {
            ExecError::IoError(format!("channel closed before exit status: {cmd}"))
        })?;

        Ok(CommandResult {
            status,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            duration: start.elapsed(),
        })
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    #[instrument(skip(self), fields(host = %self.conn_info.host))]
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        let mut slot = self.session.lock().await;
        self.connect(&mut *slot).await?;
        let session = slot.as_ref().ok_or(ExecError::NotConnected)?;

        debug!(command = %cmd, "executing remote command");

        let result = bounded(self.command_timeout, Self::exec(session, cmd)).await;

        match &result {
            Ok(r) => debug!(
                command = %cmd,
                status = r.status,
                duration = ?r.duration,
                "remote command completed"
            ),
            Err(e) => {
                warn!(command = %cmd, error = %e, "remote command aborted");
                // Force a reconnect on the next command
                *slot = None;
            }
        }

        result
    }

    fn executor_type(&self) -> &'static str {
        "ssh"
    }
}

/// Await `command`, turning an elapsed `limit` into `ExecError::Timeout`
async fn bounded<F>(limit: Option<Duration>, command: F) -> Result<CommandResult, ExecError>
where
    F: Future<Output = Result<CommandResult, ExecError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, command)
            .await
            .unwrap_or(Err(ExecError::Timeout { timeout: limit })),
        None => command.await,
    }
}

/// Builder for `SshExecutor`
pub struct SshExecutorBuilder {
    conn_info: ConnectionInfo,
    key_source: KeySource,
    command_timeout: Option<Duration>,
}

impl SshExecutorBuilder {
    /// Create builder with required fields
    pub fn new(host: impl Into<String>, user: impl Into<String>, key_source: KeySource) -> Self {
        Self {
            conn_info: ConnectionInfo::new(host, user),
            key_source,
            command_timeout: None,
        }
    }

    /// Set custom port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.conn_info = self.conn_info.with_port(port);
        self
    }

    /// Bound every command by `timeout`
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Build the executor
    ///
    /// # Errors
    /// Returns `ExecError::SshKeyError` if key resolution fails
    pub fn build(self) -> Result<SshExecutor, ExecError> {
        let mut executor = SshExecutor::new(self.conn_info, &self.key_source)?;
        executor.command_timeout = self.command_timeout;
        Ok(executor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_reports_key_errors() {
        let err = SshExecutorBuilder::new(
            "10.0.0.5",
            "fedora",
            KeySource::Path("/nonexistent/id_rsa".into()),
        )
        .with_port(2222)
        .build()
        .unwrap_err();

        assert!(matches!(err, ExecError::SshKeyError(_)));
    }

    #[tokio::test]
    async fn test_elapsed_limit_is_an_error_result() {
        let limit = Duration::from_millis(10);
        let result = bounded(Some(limit), std::future::pending()).await;

        assert_eq!(result.unwrap_err(), ExecError::Timeout { timeout: limit });
    }

    #[tokio::test]
    async fn test_no_limit_passes_result_through() {
        let result = bounded(None, async { Ok(CommandResult::ok("done")) }).await;
        assert_eq!(result.unwrap().stdout, "done");
    }

    #[tokio::test]
    #[ignore = "requires SSH server"]
    async fn test_ssh_roundtrip() {
        let executor = SshExecutorBuilder::new(
            "127.0.0.1",
            "root",
            KeySource::Env("KEELHOST_TEST_SSH_KEY".to_string()),
        )
        .build()
        .unwrap();

        let result = executor.run("true").await.unwrap();
        assert!(result.success());
    }
}
