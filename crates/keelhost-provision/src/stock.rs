//! Collaborators that need nothing beyond the remote executor
//!
//! Certificates are expected to be distributed out of band; these only
//! decide where they live and wire the engine unit to them.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::action::ServiceAction;
use crate::collab::{
    AuthConfigurer, CertificatePreparer, HostnameSetter, OptionsDirPreparer, SwarmConfigurer,
};
use crate::error::ProvisionError;
use crate::options::{AuthOptions, SwarmOptions};
use crate::provisioner::Provisioner;

/// Quote `value` as a single POSIX shell word
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Remote certificate paths under `options_dir`, keeping everything else
/// from `auth`
#[must_use]
pub fn remote_auth_options(auth: &AuthOptions, options_dir: &str) -> AuthOptions {
    let dir = Path::new(options_dir);
    let join = |file: &str| dir.join(file).to_string_lossy().into_owned();

    AuthOptions {
        ca_cert_remote_path: join("ca.pem"),
        server_cert_remote_path: join("server.pem"),
        server_key_remote_path: join("server-key.pem"),
        ..auth.clone()
    }
}

/// Sets the transient and persistent hostname
pub struct RemoteHostname;

#[async_trait]
impl HostnameSetter for RemoteHostname {
    async fn set_hostname(
        &self,
        provisioner: &dyn Provisioner,
        hostname: &str,
    ) -> Result<(), ProvisionError> {
        let name = shell_quote(hostname);
        provisioner
            .ssh_command(&format!(
                "sudo hostname {name} && echo {name} | sudo tee /etc/hostname"
            ))
            .await?;
        Ok(())
    }
}

/// Creates the engine options directory
pub struct RemoteOptionsDir;

#[async_trait]
impl OptionsDirPreparer for RemoteOptionsDir {
    async fn prepare_options_dir(
        &self,
        provisioner: &dyn Provisioner,
    ) -> Result<(), ProvisionError> {
        let dir = shell_quote(provisioner.docker_options_dir());
        provisioner
            .ssh_command(&format!("sudo mkdir -p {dir}"))
            .await?;
        Ok(())
    }
}

/// Places certificates as `ca.pem`, `server.pem` and `server-key.pem` in
/// the options directory
pub struct RemoteCertPaths;

#[async_trait]
impl CertificatePreparer for RemoteCertPaths {
    async fn remote_auth_options(
        &self,
        provisioner: &dyn Provisioner,
    ) -> Result<AuthOptions, ProvisionError> {
        Ok(remote_auth_options(
            provisioner.auth_options(),
            provisioner.docker_options_dir(),
        ))
    }
}

/// Writes the rendered engine unit and restarts the engine on it
pub struct EngineUnitWriter;

#[async_trait]
impl AuthConfigurer for EngineUnitWriter {
    async fn configure_auth(&self, provisioner: &dyn Provisioner) -> Result<(), ProvisionError> {
        let options = provisioner.generate_docker_options(provisioner.docker_port())?;

        debug!(path = %options.engine_options_path, "writing engine unit");
        provisioner
            .ssh_command(&format!(
                "printf '%s' {} | sudo tee {} > /dev/null",
                shell_quote(&options.engine_options),
                shell_quote(&options.engine_options_path),
            ))
            .await?;

        provisioner.service("docker", ServiceAction::Enable).await?;
        provisioner.service("docker", ServiceAction::Restart).await?;

        info!("docker engine restarted with TLS configuration");
        Ok(())
    }
}

/// Accepts runs that do not ask for swarm; joining a swarm is not handled
pub struct SwarmDisabled;

#[async_trait]
impl SwarmConfigurer for SwarmDisabled {
    async fn configure_swarm(
        &self,
        _provisioner: &dyn Provisioner,
        swarm: &SwarmOptions,
        _auth: &AuthOptions,
    ) -> Result<(), ProvisionError> {
        if swarm.is_swarm {
            return Err(ProvisionError::Unsupported(
                "swarm configuration requires a swarm collaborator".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("atomic-01"), "'atomic-01'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote("$(reboot)"), "'$(reboot)'");
    }

    #[test]
    fn test_remote_auth_options() {
        let local = AuthOptions {
            ca_cert_path: "/home/me/.keelhost/ca.pem".to_string(),
            ..AuthOptions::default()
        };
        let remote = remote_auth_options(&local, "/etc/docker");

        assert_eq!(remote.ca_cert_remote_path, "/etc/docker/ca.pem");
        assert_eq!(remote.server_cert_remote_path, "/etc/docker/server.pem");
        assert_eq!(remote.server_key_remote_path, "/etc/docker/server-key.pem");
        assert_eq!(remote.ca_cert_path, local.ca_cert_path);
    }
}
