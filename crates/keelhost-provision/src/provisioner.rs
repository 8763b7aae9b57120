//! Provisioner and driver interfaces

use std::sync::Arc;

use async_trait::async_trait;
use keelhost_exec::RemoteExecutor;

use crate::action::{PackageAction, ServiceAction};
use crate::error::ProvisionError;
use crate::options::{AuthOptions, DockerOptions, EngineOptions, SwarmOptions};

/// Identity of the machine being provisioned
pub trait Driver: Send + Sync {
    /// Name of the driver that created the machine, used for the
    /// `provider=<name>` engine label
    fn driver_name(&self) -> &str;

    /// Machine name, applied as the hostname
    fn machine_name(&self) -> &str;
}

/// Driver with fixed names, for machines created outside keelhost
#[derive(Debug, Clone)]
pub struct StaticDriver {
    driver_name: String,
    machine_name: String,
}

impl StaticDriver {
    pub fn new(driver_name: impl Into<String>, machine_name: impl Into<String>) -> Self {
        Self {
            driver_name: driver_name.into(),
            machine_name: machine_name.into(),
        }
    }
}

impl Driver for StaticDriver {
    fn driver_name(&self) -> &str {
        &self.driver_name
    }

    fn machine_name(&self) -> &str {
        &self.machine_name
    }
}

/// An OS-specific provisioner.
///
/// Collaborators receive `&dyn Provisioner` so they can read the current
/// options and reuse the service, rendering and command helpers.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Human readable variant name
    fn name(&self) -> &str;

    /// `ID` from `/etc/os-release` this provisioner targets
    fn os_release_id(&self) -> &str;

    fn driver(&self) -> &dyn Driver;

    fn executor(&self) -> &Arc<dyn RemoteExecutor>;

    fn engine_options(&self) -> &EngineOptions;

    fn auth_options(&self) -> &AuthOptions;

    fn swarm_options(&self) -> &SwarmOptions;

    /// Port the engine listens on for TLS connections
    fn docker_port(&self) -> u16;

    /// Remote directory holding engine certificates
    fn docker_options_dir(&self) -> &str;

    /// Remote path of the engine unit file
    fn daemon_options_file(&self) -> &str;

    /// Render the engine unit for the current options
    ///
    /// # Errors
    /// Returns `ProvisionError::Render` if the template is malformed
    fn generate_docker_options(&self, docker_port: u16) -> Result<DockerOptions, ProvisionError>;

    /// Run a command on the host, failing on a non-zero exit status
    async fn ssh_command(&self, cmd: &str) -> Result<String, ProvisionError> {
        Ok(self.executor().run_checked(cmd).await?)
    }

    async fn service(&self, name: &str, action: ServiceAction) -> Result<(), ProvisionError>;

    async fn package(&self, name: &str, action: PackageAction) -> Result<(), ProvisionError>;

    /// Run the full provisioning sequence with the given options
    async fn provision(
        &mut self,
        swarm: SwarmOptions,
        auth: AuthOptions,
        engine: EngineOptions,
    ) -> Result<(), ProvisionError>;
}
