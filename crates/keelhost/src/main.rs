//! keelhost
//!
//! Provisions Docker on image-based (Atomic Host style) machines over SSH

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use eyre::WrapErr;
use keelhost_provision::atomic::{DAEMON_OPTIONS_FILE, DOCKER_OPTIONS_DIR};
use keelhost_provision::stock::remote_auth_options;
use keelhost_provision::{
    DockerOptions, PackageAction, Provisioner, ProvisionerRegistry, ServiceAction,
    render_engine_config, resolve_engine_options,
};
use tracing_subscriber::EnvFilter;

mod config;
mod factory;

use config::{Config, LogFormat, LoggingConfig};

#[derive(Parser)]
#[command(name = "keelhost")]
#[command(about = "Provision Docker on immutable-image hosts", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, env = "KEELHOST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full provisioning sequence against the configured host
    Provision,
    /// Print the engine unit that provisioning would write
    Render {
        /// Print as JSON with the target path
        #[arg(long)]
        json: bool,
    },
    /// Apply a systemd action to a service on the host
    Service {
        name: String,
        /// start, stop, restart, enable or disable
        action: ServiceAction,
    },
    /// Upgrade the host OS image, rebooting if a new image was staged
    Upgrade,
    /// List registered provisioners
    Provisioners,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

fn render(config: &Config) -> Result<DockerOptions> {
    let mut engine = config.engine.clone();
    resolve_engine_options(&mut engine, &config.host.driver)?;
    let auth = remote_auth_options(&config.auth, DOCKER_OPTIONS_DIR);

    Ok(DockerOptions {
        engine_options: render_engine_config(&engine, &auth, config.host.docker_port)?,
        engine_options_path: DAEMON_OPTIONS_FILE.to_string(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    init_tracing(&config.logging);

    let registry = ProvisionerRegistry::with_defaults();

    match cli.command {
        Commands::Provisioners => {
            for name in registry.names() {
                println!("{name}");
            }
        }
        Commands::Render { json } => {
            let options = render(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&options)?);
            } else {
                print!("{}", options.engine_options);
            }
        }
        Commands::Provision => {
            let executor = factory::create_executor(&config.host)?;
            let mut provisioner =
                factory::create_provisioner(&config.host, &registry, executor)?;

            provisioner
                .provision(
                    config.swarm.clone(),
                    config.auth.clone(),
                    config.engine.clone(),
                )
                .await
                .wrap_err_with(|| format!("provisioning {} failed", config.host.name))?;
            println!("{} is ready", config.host.name);
        }
        Commands::Service { name, action } => {
            let executor = factory::create_executor(&config.host)?;
            let provisioner = factory::create_provisioner(&config.host, &registry, executor)?;

            provisioner
                .service(&name, action)
                .await
                .wrap_err_with(|| format!("systemctl {action} {name} failed"))?;
        }
        Commands::Upgrade => {
            let executor = factory::create_executor(&config.host)?;
            let provisioner = factory::create_provisioner(&config.host, &registry, executor)?;

            provisioner
                .package("docker", PackageAction::Upgrade)
                .await
                .wrap_err("OS image upgrade failed")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_applies_defaults() {
        let config = Config::parse("[host]\ndriver = \"virtualbox\"\n").unwrap();
        let options = render(&config).unwrap();

        assert_eq!(options.engine_options_path, DAEMON_OPTIONS_FILE);
        assert!(options.engine_options.contains("--storage-driver overlay "));
        assert!(options.engine_options.contains("--label provider=virtualbox "));
        assert!(options.engine_options.contains("--tlscacert /etc/docker/ca.pem "));
    }

    #[test]
    fn test_render_rejects_unsupported_driver() {
        let config = Config::parse("[engine]\nstorage_driver = \"btrfs\"\n").unwrap();
        assert!(render(&config).is_err());
    }

    #[test]
    fn test_cli_parses_service_action() {
        let cli = Cli::try_parse_from(["keelhost", "service", "docker", "restart"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Service { ref name, action: ServiceAction::Restart } if name == "docker"
        ));

        assert!(Cli::try_parse_from(["keelhost", "service", "docker", "bounce"]).is_err());
    }

    #[test]
    fn test_config_flag_reads_env() {
        use clap::CommandFactory;

        let command = Cli::command();
        let config = command
            .get_arguments()
            .find(|arg| arg.get_id() == "config")
            .unwrap();
        assert_eq!(config.get_env(), Some(std::ffi::OsStr::new("KEELHOST_CONFIG")));
    }
}
