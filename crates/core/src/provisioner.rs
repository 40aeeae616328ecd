//! High-level provisioning interface
//!
//! This module provides the [`Provisioner`] which serves as the primary interface
//! for the install actions. It owns the settings and the process spawner and
//! turns a named [`InstallAction`] into a [`TaskRunner`] over the action's tasks.
//!
//! ## Example
//!
//! ```rust,no_run
//! use arestor_core::configs::ProvisionArgs;
//! use arestor_core::provisioner::{InstallAction, Provisioner, ProvisionerConfig};
//!
//! # fn example() -> arestor_core::types::ArestorResult<()> {
//! let provisioner = Provisioner::new(ProvisionerConfig { settings_path: None })?;
//!
//! let mut args = provisioner.default_args(InstallAction::Argus);
//! args.build = Some("job-1234".to_string());
//!
//! let succeeded = provisioner.run(InstallAction::Argus, args)?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::configs::{load_settings, ProvisionArgs, Settings};
use crate::execution::order_tasks;
use crate::execution::process::{ProcessSpawner, SystemSpawner};
use crate::execution::runner::TaskRunner;
use crate::platform::Platform;
use crate::tasks::{ProvisionContext, TaskKind};
use crate::types::{ArestorError, ArestorResult};

/// The named actions of the `install` command group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallAction {
    /// Global OS-level prerequisites only
    Dependences,
    /// Virtual environment, Tempest and Argus-CI
    Argus,
}

impl InstallAction {
    pub const ALL: [InstallAction; 2] = [Self::Dependences, Self::Argus];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Dependences => "dependences",
            Self::Argus => "argus",
        }
    }

    pub fn tasks(&self) -> &'static [TaskKind] {
        match self {
            Self::Dependences => &[TaskKind::SetupEnvironment],
            Self::Argus => &[
                TaskKind::CreateEnvironment,
                TaskKind::InstallTempest,
                TaskKind::InstallArgusCi,
            ],
        }
    }

    /// Whether the action works inside a per-build virtual environment
    pub fn uses_venv(&self) -> bool {
        matches!(self, Self::Argus)
    }
}

impl fmt::Display for InstallAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InstallAction {
    type Err = ArestorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| ArestorError::Config(format!("Unknown install action '{}'", s)))
    }
}

/// Configuration for initializing a provisioner
pub struct ProvisionerConfig {
    pub settings_path: Option<PathBuf>,
}

/// Runs install actions against the current machine
pub struct Provisioner {
    settings: Arc<Settings>,
    spawner: Arc<dyn ProcessSpawner>,
    platform: Platform,
}

impl Provisioner {
    /// Load the settings and prepare to spawn real processes
    pub fn new(config: ProvisionerConfig) -> ArestorResult<Self> {
        let settings = load_settings(config.settings_path.as_deref())?;
        Ok(Self::with_spawner(
            settings,
            Arc::new(SystemSpawner),
            Platform::current(),
        ))
    }

    pub fn with_spawner(
        settings: Settings,
        spawner: Arc<dyn ProcessSpawner>,
        platform: Platform,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            spawner,
            platform,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Arguments for `action` seeded from the settings
    pub fn default_args(&self, action: InstallAction) -> ProvisionArgs {
        ProvisionArgs {
            setup_venv: action.uses_venv(),
            ..ProvisionArgs::from_settings(&self.settings)
        }
    }

    /// The tasks `action` runs, in execution order
    pub fn plan(&self, action: InstallAction) -> ArestorResult<Vec<TaskKind>> {
        order_tasks(action.tasks())
    }

    /// Run `action` and return whether every task succeeded.
    ///
    /// Task failures are reported through the return value; errors are only
    /// returned for invalid arguments.
    pub fn run(&self, action: InstallAction, args: ProvisionArgs) -> ArestorResult<bool> {
        if args.setup_venv && args.build.is_none() {
            return Err(ArestorError::Config(format!(
                "The '{}' action needs a build identifier",
                action
            )));
        }

        let context = ProvisionContext {
            args: Arc::new(args),
            settings: self.settings.clone(),
            spawner: self.spawner.clone(),
            platform: self.platform,
        };

        info!("Running install action {}", action);
        let mut runner = TaskRunner::new(action.name(), action.tasks(), context)?;
        Ok(runner.run())
    }
}
