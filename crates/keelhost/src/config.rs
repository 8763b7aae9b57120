//! Configuration loading and types

use std::path::{Path, PathBuf};

use keelhost_provision::registry::DEFAULT_DOCKER_PORT;
use keelhost_provision::{AuthOptions, EngineOptions, SwarmOptions};
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    /// The host to provision
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub engine: EngineOptions,
    #[serde(default)]
    pub auth: AuthOptions,
    #[serde(default)]
    pub swarm: SwarmOptions,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Connection and identity of the machine being provisioned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Machine name, applied as hostname
    #[serde(default = "default_name")]
    pub name: String,
    /// IP address or hostname for SSH; `localhost` runs commands locally
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// Path to SSH private key
    pub ssh_key: Option<PathBuf>,
    /// Environment variable holding a base64 SSH private key
    pub ssh_key_env: Option<String>,
    /// Name of the driver that created the machine (`provider=` label)
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Registered provisioner variant
    #[serde(default = "default_provisioner")]
    pub provisioner: String,
    #[serde(default = "default_docker_port")]
    pub docker_port: u16,
    /// Per-command limit enforced by the SSH transport
    pub command_timeout_secs: Option<u64>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            addr: default_addr(),
            user: default_user(),
            port: default_ssh_port(),
            ssh_key: None,
            ssh_key_env: None,
            driver: default_driver(),
            provisioner: default_provisioner(),
            docker_port: default_docker_port(),
            command_timeout_secs: None,
        }
    }
}

fn default_name() -> String {
    "default".to_string()
}

fn default_addr() -> String {
    "localhost".to_string()
}

fn default_user() -> String {
    "root".to_string()
}

fn default_ssh_port() -> u16 {
    22
}

fn default_driver() -> String {
    "generic".to_string()
}

fn default_provisioner() -> String {
    "atomic-host".to_string()
}

fn default_docker_port() -> u16 {
    DEFAULT_DOCKER_PORT
}

impl HostConfig {
    /// Whether commands run on this machine instead of over SSH
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self.addr.as_str(), "localhost" | "127.0.0.1" | "::1")
    }
}

impl Config {
    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid configuration
    pub fn parse(content: &str) -> eyre::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        use eyre::WrapErr;

        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading {}", path.display()))?;
        Self::parse(&content).wrap_err_with(|| format!("parsing {}", path.display()))
    }

    /// Load from the usual locations, else defaults
    ///
    /// # Errors
    /// Returns error if a config file exists but cannot be loaded
    pub fn load_default() -> eyre::Result<Self> {
        let mut paths = vec![
            PathBuf::from("keelhost.toml"),
            PathBuf::from("/etc/keelhost/keelhost.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("keelhost/keelhost.toml"));
        }

        for path in paths {
            if path.exists() {
                return Self::load(&path);
            }
        }

        tracing::warn!("no config file found, using defaults");
        Ok(Config::default())
    }
}
