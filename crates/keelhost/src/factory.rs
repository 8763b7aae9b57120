//! Builds the executor and provisioner for the configured host

use std::sync::Arc;
use std::time::Duration;

use eyre::{Result, WrapErr};
use keelhost_exec::{KeySource, LocalExecutor, RemoteExecutor, SshExecutorBuilder};
use keelhost_provision::{Provisioner, ProvisionerArgs, ProvisionerRegistry, StaticDriver};

use crate::config::HostConfig;

/// Create the command transport for a host
pub fn create_executor(config: &HostConfig) -> Result<Arc<dyn RemoteExecutor>> {
    if config.is_local() {
        tracing::debug!("using local executor");
        return Ok(Arc::new(LocalExecutor::new()));
    }

    let key_source = match (&config.ssh_key, &config.ssh_key_env) {
        (Some(path), _) => KeySource::Path(path.clone()),
        (None, Some(var)) => KeySource::Env(var.clone()),
        (None, None) => eyre::bail!(
            "host {} needs `ssh_key` or `ssh_key_env` to connect over SSH",
            config.addr
        ),
    };

    let mut builder = SshExecutorBuilder::new(&config.addr, &config.user, key_source)
        .with_port(config.port);
    if let Some(secs) = config.command_timeout_secs {
        builder = builder.with_command_timeout(Duration::from_secs(secs));
    }

    let executor = builder
        .build()
        .wrap_err("failed to create SSH executor")?;
    Ok(Arc::new(executor))
}

/// Create the configured provisioner variant on top of `executor`
pub fn create_provisioner(
    config: &HostConfig,
    registry: &ProvisionerRegistry,
    executor: Arc<dyn RemoteExecutor>,
) -> Result<Box<dyn Provisioner>> {
    let driver = Arc::new(StaticDriver::new(&config.driver, &config.name));
    let args = ProvisionerArgs::new(driver, executor).with_docker_port(config.docker_port);

    registry
        .create(&config.provisioner, args)
        .wrap_err_with(|| {
            let known: Vec<&str> = registry.names().collect();
            format!("available provisioners: {}", known.join(", "))
        })
}
