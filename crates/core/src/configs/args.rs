use std::time::Duration;

use crate::configs::settings::Settings;

pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_ARGUS_BRANCH: &str = "master";
pub const DEFAULT_TEMPEST_BRANCH: &str = "tags/7";

/// Options a provisioning action was invoked with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionArgs {
    /// Account the per-build commands run as (through `sudo -u`)
    pub user: String,
    pub argus_branch: String,
    pub tempest_branch: String,
    /// Unique identifier of the CI job; names the virtual environment
    pub build: Option<String>,
    pub setup_venv: bool,
    pub attempts: u32,
    pub retry_interval: Duration,
}

impl ProvisionArgs {
    /// Arguments seeded from the settings defaults
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            argus_branch: DEFAULT_ARGUS_BRANCH.to_string(),
            tempest_branch: DEFAULT_TEMPEST_BRANCH.to_string(),
            build: None,
            setup_venv: false,
            attempts: settings.attempts,
            retry_interval: Duration::from_secs(settings.retry_interval),
        }
    }
}

impl Default for ProvisionArgs {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}
