//! keelhost-provision: Docker engine provisioning for image-based hosts
//!
//! Renders the engine unit file, drives systemd over the remote executor,
//! runs rpm-ostree style OS upgrades and sequences a provisioning run with
//! fail-fast semantics. Hostname, certificate and swarm handling are reached
//! through the collaborator traits in [`collab`].

pub mod action;
pub mod atomic;
pub mod collab;
pub mod error;
pub mod options;
pub mod provisioner;
pub mod registry;
pub mod render;
pub mod service;
pub mod state;
pub mod stock;
pub mod upgrade;

pub use action::{PackageAction, ParseActionError, ServiceAction};
pub use atomic::{AtomicHostProvisioner, SUPPORTED_STORAGE_DRIVER, resolve_engine_options};
pub use collab::{
    AuthConfigurer, CertificatePreparer, Collaborators, HostnameSetter, OptionsDirPreparer,
    SwarmConfigurer,
};
pub use error::{ErrorKind, ProvisionError, RenderError};
pub use options::{AuthOptions, DockerOptions, EngineOptions, SwarmOptions};
pub use provisioner::{Driver, Provisioner, StaticDriver};
pub use registry::{ProvisionerArgs, ProvisionerFactory, ProvisionerRegistry};
pub use render::render_engine_config;
pub use service::ServiceController;
pub use state::ProvisionStep;
pub use upgrade::{UpgradeManager, UpgradeOutcome};
