//! Image-based OS upgrades (`atomic host upgrade` / rpm-ostree)

use std::sync::Arc;

use keelhost_exec::{ExecError, RemoteExecutor};
use tracing::{debug, info, instrument};

use crate::error::ProvisionError;

pub const UPGRADE_COMMAND: &str = "sudo atomic host upgrade";
pub const REBOOT_COMMAND: &str = "sudo reboot";

/// rpm-ostree exit status for "nothing to upgrade"
pub const NO_CHANGES_EXIT_STATUS: i32 = 77;

/// Printed instead of exiting 77 by rpm-ostree releases that predate it
pub const NO_UPGRADE_MARKER: &str = "No upgrade available.";

/// How an upgrade run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    NoUpgradeAvailable,
    /// New deployment staged, reboot needed to boot into it
    UpgradedPendingReboot,
    Failed(ExecError),
}

impl UpgradeOutcome {
    /// Classify the result of [`UPGRADE_COMMAND`].
    ///
    /// Both no-op signals are honored: the exit status and the output text.
    /// Hosts in the field run rpm-ostree builds that disagree on which one
    /// they use.
    #[must_use]
    pub fn classify(result: Result<String, ExecError>) -> Self {
        match result {
            Err(e) if e.exit_status() == Some(NO_CHANGES_EXIT_STATUS) => {
                UpgradeOutcome::NoUpgradeAvailable
            }
            Err(e) => UpgradeOutcome::Failed(e),
            Ok(output) if output.contains(NO_UPGRADE_MARKER) => UpgradeOutcome::NoUpgradeAvailable,
            Ok(_) => UpgradeOutcome::UpgradedPendingReboot,
        }
    }
}

/// Runs OS image upgrades and reboots into the new deployment
#[derive(Clone)]
pub struct UpgradeManager {
    executor: Arc<dyn RemoteExecutor>,
}

impl UpgradeManager {
    pub fn new(executor: Arc<dyn RemoteExecutor>) -> Self {
        Self { executor }
    }

    /// Upgrade the host image and reboot if a new deployment was staged.
    ///
    /// Idempotent when nothing is pending: returns `Ok` without rebooting.
    ///
    /// # Errors
    /// Returns `ProvisionError::Transport` if the upgrade command fails for
    /// any reason other than "no changes"
    #[instrument(skip(self))]
    pub async fn upgrade(&self) -> Result<UpgradeOutcome, ProvisionError> {
        info!("running '{UPGRADE_COMMAND}' (this may take a while)");

        let outcome = UpgradeOutcome::classify(self.executor.run_checked(UPGRADE_COMMAND).await);

        match &outcome {
            UpgradeOutcome::NoUpgradeAvailable => info!("no upgrade available at this time"),
            UpgradeOutcome::UpgradedPendingReboot => {
                info!("upgrade succeeded, rebooting");
                self.reboot_best_effort().await;
            }
            UpgradeOutcome::Failed(e) => return Err(e.clone().into()),
        }

        Ok(outcome)
    }

    /// Issue a reboot and ignore the result.
    ///
    /// The host drops the connection while going down, so a transport error
    /// here is the expected outcome, not a failure.
    async fn reboot_best_effort(&self) {
        if let Err(e) = self.executor.run_checked(REBOOT_COMMAND).await {
            debug!(error = %e, "reboot command ended with error (connection drop expected)");
        }
    }
}
