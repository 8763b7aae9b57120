//! Error types for keelhost-provision

use keelhost_exec::ExecError;
use thiserror::Error;

use crate::state::ProvisionStep;

/// Engine unit template failure
///
/// Always a defect in the embedded template, never a runtime condition of
/// the host.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("engine unit template: {0}")]
    Template(#[from] tera::Error),
}

/// Errors that can occur while provisioning a host
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Storage driver the provisioner cannot run
    #[error("unsupported storage driver: {0}")]
    UnsupportedStorageDriver(String),

    /// Remote command failed or the transport broke
    #[error(transparent)]
    Transport(#[from] ExecError),

    /// Engine unit could not be rendered
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A provisioning step failed; `source` is the error it produced
    #[error("{step} failed: {source}")]
    Step {
        step: ProvisionStep,
        source: Box<ProvisionError>,
    },

    /// No provisioner registered under this name
    #[error("unknown provisioner: {0}")]
    UnknownProvisioner(String),

    /// Feature this provisioner does not handle
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Coarse classification of a [`ProvisionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    Render,
}

impl ProvisionError {
    /// Attribute this error to a provisioning step
    #[must_use]
    pub fn during(self, step: ProvisionStep) -> Self {
        ProvisionError::Step {
            step,
            source: Box::new(self),
        }
    }

    /// Step that produced the error, if it came out of a provisioning run
    #[must_use]
    pub fn step(&self) -> Option<ProvisionStep> {
        match self {
            ProvisionError::Step { step, .. } => Some(*step),
            ProvisionError::UnsupportedStorageDriver(_) => {
                Some(ProvisionStep::SettingStorageDriver)
            }
            _ => None,
        }
    }

    /// Error with step attribution peeled off
    #[must_use]
    pub fn root(&self) -> &ProvisionError {
        match self {
            ProvisionError::Step { source, .. } => source.root(),
            other => other,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            ProvisionError::Transport(_) => ErrorKind::Transport,
            ProvisionError::Render(_) => ErrorKind::Render,
            _ => ErrorKind::Validation,
        }
    }

    /// Exit status of the failed remote command, if any
    #[must_use]
    pub fn exit_status(&self) -> Option<i32> {
        match self.root() {
            ProvisionError::Transport(e) => e.exit_status(),
            _ => None,
        }
    }
}
