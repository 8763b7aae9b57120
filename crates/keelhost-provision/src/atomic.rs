//! `AtomicHostProvisioner`: Docker on Atomic Host style systems
//!
//! The root filesystem is an rpm-ostree image, so the engine is configured
//! purely through its systemd unit and "upgrading docker" means upgrading
//! the whole OS image.

use std::sync::Arc;

use async_trait::async_trait;
use keelhost_exec::RemoteExecutor;
use tracing::{debug, error, info, instrument};

use crate::action::{PackageAction, ServiceAction};
use crate::collab::Collaborators;
use crate::error::ProvisionError;
use crate::options::{AuthOptions, DockerOptions, EngineOptions, SwarmOptions};
use crate::provisioner::{Driver, Provisioner};
use crate::registry::ProvisionerArgs;
use crate::render::render_engine_config;
use crate::service::ServiceController;
use crate::state::ProvisionStep;
use crate::upgrade::UpgradeManager;

/// The only storage driver the image ships kernel support for
pub const SUPPORTED_STORAGE_DRIVER: &str = "overlay";

pub const DOCKER_OPTIONS_DIR: &str = "/etc/docker";
pub const DAEMON_OPTIONS_FILE: &str = "/etc/systemd/system/docker.service";

/// Default the storage driver, reject unsupported ones and append the
/// `provider=<driver>` label.
///
/// Appends on every call; callers resolve a fresh copy of the options.
///
/// # Errors
/// Returns `ProvisionError::UnsupportedStorageDriver` for anything but
/// [`SUPPORTED_STORAGE_DRIVER`]
pub fn resolve_engine_options(
    engine: &mut EngineOptions,
    driver_name: &str,
) -> Result<(), ProvisionError> {
    if engine.storage_driver.is_empty() {
        engine.storage_driver = SUPPORTED_STORAGE_DRIVER.to_string();
    } else if engine.storage_driver != SUPPORTED_STORAGE_DRIVER {
        return Err(ProvisionError::UnsupportedStorageDriver(
            engine.storage_driver.clone(),
        ));
    }

    engine.labels.push(format!("provider={driver_name}"));
    Ok(())
}

pub struct AtomicHostProvisioner {
    os_release_id: String,
    driver: Arc<dyn Driver>,
    executor: Arc<dyn RemoteExecutor>,
    collaborators: Collaborators,
    services: ServiceController,
    upgrades: UpgradeManager,
    docker_port: u16,
    engine_options: EngineOptions,
    auth_options: AuthOptions,
    swarm_options: SwarmOptions,
    step: ProvisionStep,
}

impl AtomicHostProvisioner {
    pub fn new(os_release_id: impl Into<String>, args: ProvisionerArgs) -> Self {
        Self {
            os_release_id: os_release_id.into(),
            services: ServiceController::new(Arc::clone(&args.executor)),
            upgrades: UpgradeManager::new(Arc::clone(&args.executor)),
            driver: args.driver,
            executor: args.executor,
            collaborators: args.collaborators,
            docker_port: args.docker_port,
            engine_options: EngineOptions::default(),
            auth_options: AuthOptions::default(),
            swarm_options: SwarmOptions::default(),
            step: ProvisionStep::SettingStorageDriver,
        }
    }

    /// Step the last run reached; the failing step if it aborted
    #[must_use]
    pub fn step(&self) -> ProvisionStep {
        self.step
    }

    fn enter(&mut self, step: ProvisionStep) {
        debug!(from = %self.step, to = %step, "provisioning step");
        self.step = step;
    }

    async fn run_steps(&mut self) -> Result<(), ProvisionError> {
        self.enter(ProvisionStep::SettingStorageDriver);
        while !self.step.is_done() {
            self.run_step(self.step).await?;
            self.enter(self.step.next());
        }
        Ok(())
    }

    async fn run_step(&mut self, step: ProvisionStep) -> Result<(), ProvisionError> {
        let collab = self.collaborators.clone();

        let result = match step {
            // validation errors surface unwrapped
            ProvisionStep::SettingStorageDriver => {
                let driver_name = self.driver.driver_name();
                return resolve_engine_options(&mut self.engine_options, driver_name);
            }
            ProvisionStep::SettingHostname => {
                let hostname = self.driver.machine_name().to_string();
                debug!(hostname = %hostname, "setting hostname");
                collab.hostname.set_hostname(&*self, &hostname).await
            }
            ProvisionStep::PreparingOptionsDir => {
                collab.options_dir.prepare_options_dir(&*self).await
            }
            ProvisionStep::PreparingCertificates => {
                let auth = collab.certificates.remote_auth_options(&*self).await;
                auth.map(|auth| self.auth_options = auth)
            }
            ProvisionStep::ConfiguringAuth => collab.auth.configure_auth(&*self).await,
            ProvisionStep::ConfiguringSwarm => {
                collab
                    .swarm
                    .configure_swarm(&*self, &self.swarm_options, &self.auth_options)
                    .await
            }
            ProvisionStep::Done => Ok(()),
        };

        result.map_err(|e| e.during(step))
    }
}

impl std::fmt::Debug for AtomicHostProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomicHostProvisioner")
            .field("os_release_id", &self.os_release_id)
            .field("executor", &self.executor.executor_type())
            .field("docker_port", &self.docker_port)
            .field("step", &self.step)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for AtomicHostProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.os_release_id)
    }
}

#[async_trait]
impl Provisioner for AtomicHostProvisioner {
    fn name(&self) -> &str {
        &self.os_release_id
    }

    fn os_release_id(&self) -> &str {
        &self.os_release_id
    }

    fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    fn executor(&self) -> &Arc<dyn RemoteExecutor> {
        &self.executor
    }

    fn engine_options(&self) -> &EngineOptions {
        &self.engine_options
    }

    fn auth_options(&self) -> &AuthOptions {
        &self.auth_options
    }

    fn swarm_options(&self) -> &SwarmOptions {
        &self.swarm_options
    }

    fn docker_port(&self) -> u16 {
        self.docker_port
    }

    fn docker_options_dir(&self) -> &str {
        DOCKER_OPTIONS_DIR
    }

    fn daemon_options_file(&self) -> &str {
        DAEMON_OPTIONS_FILE
    }

    fn generate_docker_options(&self, docker_port: u16) -> Result<DockerOptions, ProvisionError> {
        let engine_options =
            render_engine_config(&self.engine_options, &self.auth_options, docker_port)?;

        debug!(path = DAEMON_OPTIONS_FILE, "generated engine unit");
        Ok(DockerOptions {
            engine_options,
            engine_options_path: DAEMON_OPTIONS_FILE.to_string(),
        })
    }

    async fn service(&self, name: &str, action: ServiceAction) -> Result<(), ProvisionError> {
        self.services.service(name, action).await
    }

    /// Only upgrading docker does anything; it upgrades the OS image,
    /// which is where docker comes from on these hosts.
    async fn package(&self, name: &str, action: PackageAction) -> Result<(), ProvisionError> {
        if name == "docker" && action == PackageAction::Upgrade {
            self.upgrades.upgrade().await?;
        } else {
            debug!(package = %name, action = %action, "package action not applicable, skipping");
        }
        Ok(())
    }

    /// Run the provisioning sequence on this provisioner's own copy of the
    /// options.
    ///
    /// Stops at the first failing step. A storage-driver rejection happens
    /// before any remote command; later failures leave whatever earlier
    /// steps applied on the host.
    #[instrument(skip_all, fields(provisioner = %self.os_release_id, machine = %self.driver.machine_name()))]
    async fn provision(
        &mut self,
        mut swarm: SwarmOptions,
        auth: AuthOptions,
        engine: EngineOptions,
    ) -> Result<(), ProvisionError> {
        swarm.env.clone_from(&engine.env);
        self.swarm_options = swarm;
        self.auth_options = auth;
        self.engine_options = engine;

        match self.run_steps().await {
            Ok(()) => {
                info!("provisioning complete");
                Ok(())
            }
            Err(e) => {
                error!(step = %self.step, error = %e, "provisioning aborted");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_storage_driver() {
        let mut engine = EngineOptions::default();
        resolve_engine_options(&mut engine, "generic").unwrap();

        assert_eq!(engine.storage_driver, "overlay");
        assert_eq!(engine.labels, vec!["provider=generic".to_string()]);
    }

    #[test]
    fn test_rejects_other_drivers() {
        for driver in ["btrfs", "devicemapper", "overlay2"] {
            let mut engine = EngineOptions {
                storage_driver: driver.to_string(),
                ..EngineOptions::default()
            };
            let err = resolve_engine_options(&mut engine, "generic").unwrap_err();

            assert!(matches!(err, ProvisionError::UnsupportedStorageDriver(ref d) if d == driver));
            assert!(engine.labels.is_empty());
        }
    }

    #[test]
    fn test_provider_label_always_appended() {
        let mut engine = EngineOptions {
            labels: vec!["env=prod".to_string(), "provider=virtualbox".to_string()],
            ..EngineOptions::default()
        };
        resolve_engine_options(&mut engine, "virtualbox").unwrap();

        assert_eq!(
            engine.labels,
            vec![
                "env=prod".to_string(),
                "provider=virtualbox".to_string(),
                "provider=virtualbox".to_string(),
            ]
        );
    }
}
