//! Option sets consumed by a provisioning run

use serde::{Deserialize, Serialize};

/// Docker engine runtime settings
///
/// List fields are rendered in order, one flag per entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Storage driver; empty means "use the provisioner default"
    pub storage_driver: String,
    /// Engine labels (`key=value`)
    pub labels: Vec<String>,
    /// Registries reachable without TLS verification
    pub insecure_registry: Vec<String>,
    /// Pull-through registry mirrors
    pub registry_mirror: Vec<String>,
    /// Extra daemon flags without the leading `--`
    pub arbitrary_flags: Vec<String>,
    /// Environment for the engine process (`NAME=value`)
    pub env: Vec<String>,
}

/// TLS material locations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthOptions {
    /// Local CA certificate, distributed out of band
    pub ca_cert_path: String,
    /// Local server certificate
    pub server_cert_path: String,
    /// Local server key
    pub server_key_path: String,
    /// CA certificate path on the provisioned host
    pub ca_cert_remote_path: String,
    /// Server certificate path on the provisioned host
    pub server_cert_remote_path: String,
    /// Server key path on the provisioned host
    pub server_key_remote_path: String,
}

/// Swarm join settings, handed to the swarm collaborator untouched apart
/// from `env`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmOptions {
    pub is_swarm: bool,
    pub master: bool,
    pub address: String,
    pub discovery: String,
    pub host: String,
    pub strategy: String,
    pub image: String,
    pub arbitrary_flags: Vec<String>,
    /// Overwritten with the engine environment at the start of a run
    pub env: Vec<String>,
}

/// Rendered engine configuration and where it belongs on the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DockerOptions {
    /// Unit file text
    pub engine_options: String,
    /// Remote path the text must be written to
    pub engine_options_path: String,
}
