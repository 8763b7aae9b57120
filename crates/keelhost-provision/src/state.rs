//! Provisioning run state machine

use std::fmt;

use serde::Serialize;

/// Steps of a provisioning run, in execution order
///
/// A run only ever moves forward. It stops at the first failing step and
/// stays there; nothing already applied to the host is rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionStep {
    SettingStorageDriver,
    SettingHostname,
    PreparingOptionsDir,
    PreparingCertificates,
    ConfiguringAuth,
    ConfiguringSwarm,
    Done,
}

impl ProvisionStep {
    /// Step that follows this one; `Done` is terminal
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            ProvisionStep::SettingStorageDriver => ProvisionStep::SettingHostname,
            ProvisionStep::SettingHostname => ProvisionStep::PreparingOptionsDir,
            ProvisionStep::PreparingOptionsDir => ProvisionStep::PreparingCertificates,
            ProvisionStep::PreparingCertificates => ProvisionStep::ConfiguringAuth,
            ProvisionStep::ConfiguringAuth => ProvisionStep::ConfiguringSwarm,
            ProvisionStep::ConfiguringSwarm | ProvisionStep::Done => ProvisionStep::Done,
        }
    }

    /// Whether the run finished
    #[must_use]
    pub fn is_done(self) -> bool {
        self == ProvisionStep::Done
    }
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProvisionStep::SettingStorageDriver => "setting storage driver",
            ProvisionStep::SettingHostname => "setting hostname",
            ProvisionStep::PreparingOptionsDir => "preparing options dir",
            ProvisionStep::PreparingCertificates => "preparing certificates",
            ProvisionStep::ConfiguringAuth => "configuring auth",
            ProvisionStep::ConfiguringSwarm => "configuring swarm",
            ProvisionStep::Done => "done",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_order() {
        let mut step = ProvisionStep::SettingStorageDriver;
        let mut seen = vec![step];
        while !step.is_done() {
            let next = step.next();
            assert!(next > step);
            step = next;
            seen.push(step);
        }
        assert_eq!(seen.len(), 7);
        assert_eq!(ProvisionStep::Done.next(), ProvisionStep::Done);
    }
}
