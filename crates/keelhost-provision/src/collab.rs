//! Collaborator interfaces used by a provisioning run
//!
//! Each provisioning step beyond storage-driver validation delegates to
//! exactly one of these. Stock implementations live in [`crate::stock`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProvisionError;
use crate::options::{AuthOptions, SwarmOptions};
use crate::provisioner::Provisioner;
use crate::stock::{
    EngineUnitWriter, RemoteCertPaths, RemoteHostname, RemoteOptionsDir, SwarmDisabled,
};

#[async_trait]
pub trait HostnameSetter: Send + Sync {
    async fn set_hostname(
        &self,
        provisioner: &dyn Provisioner,
        hostname: &str,
    ) -> Result<(), ProvisionError>;
}

#[async_trait]
pub trait OptionsDirPreparer: Send + Sync {
    async fn prepare_options_dir(&self, provisioner: &dyn Provisioner)
    -> Result<(), ProvisionError>;
}

/// Decides where certificates live on the host
#[async_trait]
pub trait CertificatePreparer: Send + Sync {
    async fn remote_auth_options(
        &self,
        provisioner: &dyn Provisioner,
    ) -> Result<AuthOptions, ProvisionError>;
}

/// Puts TLS material in place and (re)starts the engine with it
#[async_trait]
pub trait AuthConfigurer: Send + Sync {
    async fn configure_auth(&self, provisioner: &dyn Provisioner) -> Result<(), ProvisionError>;
}

#[async_trait]
pub trait SwarmConfigurer: Send + Sync {
    async fn configure_swarm(
        &self,
        provisioner: &dyn Provisioner,
        swarm: &SwarmOptions,
        auth: &AuthOptions,
    ) -> Result<(), ProvisionError>;
}

/// The full set of collaborators a provisioner runs with
#[derive(Clone)]
pub struct Collaborators {
    pub hostname: Arc<dyn HostnameSetter>,
    pub options_dir: Arc<dyn OptionsDirPreparer>,
    pub certificates: Arc<dyn CertificatePreparer>,
    pub auth: Arc<dyn AuthConfigurer>,
    pub swarm: Arc<dyn SwarmConfigurer>,
}

impl Collaborators {
    /// Collaborators that work over the remote executor alone
    #[must_use]
    pub fn stock() -> Self {
        Self {
            hostname: Arc::new(RemoteHostname),
            options_dir: Arc::new(RemoteOptionsDir),
            certificates: Arc::new(RemoteCertPaths),
            auth: Arc::new(EngineUnitWriter),
            swarm: Arc::new(SwarmDisabled),
        }
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::stock()
    }
}
