//! keelhost-exec: Remote command transport
//!
//! Runs shell commands on the host being provisioned, either over SSH or
//! locally. Provisioning logic only sees the [`RemoteExecutor`] trait.

pub mod error;
pub mod keys;
pub mod local;
pub mod result;
pub mod ssh;
pub mod traits;

pub use error::ExecError;
pub use keys::{KeyError, KeySource, ResolvedKey};
pub use local::LocalExecutor;
pub use result::{CommandResult, ConnectionInfo};
pub use ssh::{SshExecutor, SshExecutorBuilder};
pub use traits::RemoteExecutor;
