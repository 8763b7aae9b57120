//! systemd service control over the remote executor

use std::sync::Arc;

use keelhost_exec::RemoteExecutor;
use tracing::{debug, instrument};

use crate::action::ServiceAction;
use crate::error::ProvisionError;

pub const DAEMON_RELOAD_COMMAND: &str = "sudo systemctl daemon-reload";

/// Drives systemd units on the provisioned host
#[derive(Clone)]
pub struct ServiceController {
    executor: Arc<dyn RemoteExecutor>,
}

impl ServiceController {
    pub fn new(executor: Arc<dyn RemoteExecutor>) -> Self {
        Self { executor }
    }

    /// Command line for `action` on `name`
    #[must_use]
    pub fn command(name: &str, action: ServiceAction) -> String {
        format!("sudo systemctl {action} {name}")
    }

    /// Apply `action` to the unit `name`.
    ///
    /// Start and Restart are preceded by a daemon-reload so systemd picks up
    /// a unit file that was just rewritten. If the reload fails the action
    /// is not attempted. Nothing is retried.
    ///
    /// # Errors
    /// Returns `ProvisionError::Transport` from whichever command failed
    #[instrument(skip(self), level = "debug")]
    pub async fn service(&self, name: &str, action: ServiceAction) -> Result<(), ProvisionError> {
        if action.needs_daemon_reload() {
            self.executor.run_checked(DAEMON_RELOAD_COMMAND).await?;
        }

        self.executor
            .run_checked(&Self::command(name, action))
            .await?;

        debug!(service = %name, action = %action, "service action applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use keelhost_exec::{CommandResult, ExecError};

    use super::*;

    /// Records commands; fails any command containing `fail_on`
    #[derive(Default)]
    struct Recorder {
        commands: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl RemoteExecutor for Recorder {
        async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
            self.commands.lock().unwrap().push(cmd.to_string());
            match self.fail_on {
                Some(needle) if cmd.contains(needle) => Ok(CommandResult::failed(1, "failed")),
                _ => Ok(CommandResult::ok("")),
            }
        }

        fn executor_type(&self) -> &'static str {
            "recorder"
        }
    }

    fn controller(recorder: &Arc<Recorder>) -> ServiceController {
        ServiceController::new(Arc::clone(recorder) as Arc<dyn RemoteExecutor>)
    }

    #[tokio::test]
    async fn test_start_reloads_first() {
        let recorder = Arc::new(Recorder::default());
        controller(&recorder)
            .service("docker", ServiceAction::Start)
            .await
            .unwrap();

        assert_eq!(
            *recorder.commands.lock().unwrap(),
            vec![
                "sudo systemctl daemon-reload".to_string(),
                "sudo systemctl start docker".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_restart_reloads_first() {
        let recorder = Arc::new(Recorder::default());
        controller(&recorder)
            .service("docker", ServiceAction::Restart)
            .await
            .unwrap();

        let commands = recorder.commands.lock().unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1], "sudo systemctl restart docker");
    }

    #[tokio::test]
    async fn test_stop_skips_reload() {
        let recorder = Arc::new(Recorder::default());
        controller(&recorder)
            .service("docker", ServiceAction::Stop)
            .await
            .unwrap();

        assert_eq!(
            *recorder.commands.lock().unwrap(),
            vec!["sudo systemctl stop docker".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_reload_skips_action() {
        let recorder = Arc::new(Recorder {
            fail_on: Some("daemon-reload"),
            ..Recorder::default()
        });
        let err = controller(&recorder)
            .service("docker", ServiceAction::Start)
            .await
            .unwrap_err();

        assert_eq!(err.exit_status(), Some(1));
        assert_eq!(recorder.commands.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_action_is_returned() {
        let recorder = Arc::new(Recorder {
            fail_on: Some("enable"),
            ..Recorder::default()
        });
        let err = controller(&recorder)
            .service("docker", ServiceAction::Enable)
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Transport(_)));
    }
}
