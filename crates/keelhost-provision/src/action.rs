//! Service and package actions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// systemd lifecycle action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
    Enable,
    Disable,
}

impl ServiceAction {
    /// Whether systemd must re-read unit files before this action
    #[must_use]
    pub fn needs_daemon_reload(self) -> bool {
        matches!(self, ServiceAction::Start | ServiceAction::Restart)
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceAction::Start => write!(f, "start"),
            ServiceAction::Stop => write!(f, "stop"),
            ServiceAction::Restart => write!(f, "restart"),
            ServiceAction::Enable => write!(f, "enable"),
            ServiceAction::Disable => write!(f, "disable"),
        }
    }
}

impl FromStr for ServiceAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(ServiceAction::Start),
            "stop" => Ok(ServiceAction::Stop),
            "restart" => Ok(ServiceAction::Restart),
            "enable" => Ok(ServiceAction::Enable),
            "disable" => Ok(ServiceAction::Disable),
            other => Err(ParseActionError(other.to_string())),
        }
    }
}

/// Package action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageAction {
    Install,
    Remove,
    Upgrade,
}

impl fmt::Display for PackageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageAction::Install => write!(f, "install"),
            PackageAction::Remove => write!(f, "remove"),
            PackageAction::Upgrade => write!(f, "upgrade"),
        }
    }
}

impl FromStr for PackageAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "install" => Ok(PackageAction::Install),
            "remove" => Ok(PackageAction::Remove),
            "upgrade" => Ok(PackageAction::Upgrade),
            other => Err(ParseActionError(other.to_string())),
        }
    }
}

/// Unrecognised action name
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown action: {0}")]
pub struct ParseActionError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_only_for_start_and_restart() {
        assert!(ServiceAction::Start.needs_daemon_reload());
        assert!(ServiceAction::Restart.needs_daemon_reload());
        assert!(!ServiceAction::Stop.needs_daemon_reload());
        assert!(!ServiceAction::Enable.needs_daemon_reload());
        assert!(!ServiceAction::Disable.needs_daemon_reload());
    }

    #[test]
    fn test_display_matches_systemctl_verbs() {
        for action in [
            ServiceAction::Start,
            ServiceAction::Stop,
            ServiceAction::Restart,
            ServiceAction::Enable,
            ServiceAction::Disable,
        ] {
            assert_eq!(action.to_string().parse::<ServiceAction>(), Ok(action));
        }
        assert_eq!(ServiceAction::Restart.to_string(), "restart");
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            "reload-or-restart".parse::<ServiceAction>(),
            Err(ParseActionError("reload-or-restart".to_string()))
        );
        assert_eq!("upgrade".parse::<PackageAction>(), Ok(PackageAction::Upgrade));
    }
}
