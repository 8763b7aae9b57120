//! Named provisioner variants
//!
//! The registry is an ordinary value built at startup; nothing registers
//! itself implicitly.

use std::collections::BTreeMap;
use std::sync::Arc;

use keelhost_exec::RemoteExecutor;
use tracing::warn;

use crate::atomic::AtomicHostProvisioner;
use crate::collab::Collaborators;
use crate::error::ProvisionError;
use crate::provisioner::{Driver, Provisioner};

/// Engine TLS port used when the configuration does not set one
pub const DEFAULT_DOCKER_PORT: u16 = 2376;

/// Everything a provisioner variant is built from
#[derive(Clone)]
pub struct ProvisionerArgs {
    pub driver: Arc<dyn Driver>,
    pub executor: Arc<dyn RemoteExecutor>,
    pub collaborators: Collaborators,
    pub docker_port: u16,
}

impl ProvisionerArgs {
    /// Args with stock collaborators and the default engine port
    pub fn new(driver: Arc<dyn Driver>, executor: Arc<dyn RemoteExecutor>) -> Self {
        Self {
            driver,
            executor,
            collaborators: Collaborators::stock(),
            docker_port: DEFAULT_DOCKER_PORT,
        }
    }

    #[must_use]
    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    #[must_use]
    pub fn with_docker_port(mut self, port: u16) -> Self {
        self.docker_port = port;
        self
    }
}

pub type ProvisionerFactory =
    Arc<dyn Fn(ProvisionerArgs) -> Box<dyn Provisioner> + Send + Sync>;

/// Maps a variant name from configuration to its factory
#[derive(Clone, Default)]
pub struct ProvisionerRegistry {
    factories: BTreeMap<String, ProvisionerFactory>,
}

impl ProvisionerRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in variant
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("atomic-host", |args| {
            Box::new(AtomicHostProvisioner::new("atomic.host", args))
        });
        registry
    }

    /// Register `factory` under `name`, replacing any previous entry
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(ProvisionerArgs) -> Box<dyn Provisioner> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.insert(name.clone(), Arc::new(factory)).is_some() {
            warn!(provisioner = %name, "replaced registered provisioner");
        }
    }

    /// Build the provisioner registered as `name`
    ///
    /// # Errors
    /// Returns `ProvisionError::UnknownProvisioner` if nothing is registered
    /// under `name`
    pub fn create(
        &self,
        name: &str,
        args: ProvisionerArgs,
    ) -> Result<Box<dyn Provisioner>, ProvisionError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ProvisionError::UnknownProvisioner(name.to_string()))?;
        Ok(factory(args))
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use keelhost_exec::LocalExecutor;

    use super::*;
    use crate::provisioner::StaticDriver;

    fn args() -> ProvisionerArgs {
        ProvisionerArgs::new(
            Arc::new(StaticDriver::new("generic", "atomic-01")),
            Arc::new(LocalExecutor::new()),
        )
    }

    #[test]
    fn test_defaults_contain_atomic_host() {
        let registry = ProvisionerRegistry::with_defaults();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["atomic-host"]);

        let provisioner = registry.create("atomic-host", args()).unwrap();
        assert_eq!(provisioner.os_release_id(), "atomic.host");
        assert_eq!(provisioner.docker_port(), DEFAULT_DOCKER_PORT);
        assert_eq!(provisioner.driver().machine_name(), "atomic-01");
    }

    #[test]
    fn test_unknown_name() {
        let registry = ProvisionerRegistry::with_defaults();
        let err = registry.create("coreos", args()).err().unwrap();
        assert!(matches!(err, ProvisionError::UnknownProvisioner(ref n) if n == "coreos"));
    }

    #[test]
    fn test_register_custom_variant() {
        let mut registry = ProvisionerRegistry::new();
        registry.register("centos-atomic", |args| {
            Box::new(AtomicHostProvisioner::new("centos", args))
        });

        let provisioner = registry
            .create("centos-atomic", args().with_docker_port(3376))
            .unwrap();
        assert_eq!(provisioner.os_release_id(), "centos");
        assert_eq!(provisioner.docker_port(), 3376);
    }
}
