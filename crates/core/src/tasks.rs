//! Provisioning tasks
//!
//! A task is one provisioning step driven through the [`Lifecycle`] contract.
//! Tasks are described by a [`TaskKind`] and only built, from the owner's
//! [`ProvisionContext`], right before they run.

pub mod create_environment;
pub mod install_argus;
pub mod install_tempest;
pub mod setup_environment;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::configs::{ProvisionArgs, Settings};
use crate::execution::command::{CommandExecutor, ProcessOutput, RetryPolicy};
use crate::execution::process::ProcessSpawner;
use crate::lifecycle::Lifecycle;
use crate::platform::Platform;
use crate::types::{ArestorError, ArestorResult};

pub use create_environment::CreateEnvironment;
pub use install_argus::InstallArgusCi;
pub use install_tempest::InstallTempest;
pub use setup_environment::SetupEnvironment;

/// Every task this tool knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    SetupEnvironment,
    CreateEnvironment,
    InstallTempest,
    InstallArgusCi,
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetupEnvironment => "SetupEnvironment",
            Self::CreateEnvironment => "CreateEnvironment",
            Self::InstallTempest => "InstallTempest",
            Self::InstallArgusCi => "InstallArgusCi",
        }
    }

    /// Tasks that have to run before this one when they are part of the same sequence
    pub fn prerequisites(&self) -> &'static [TaskKind] {
        match self {
            Self::SetupEnvironment | Self::CreateEnvironment => &[],
            Self::InstallTempest | Self::InstallArgusCi => &[Self::CreateEnvironment],
        }
    }

    pub fn build(&self, context: &ProvisionContext) -> ArestorResult<Box<dyn Lifecycle>> {
        let binding = TaskBinding::bind(context)?;
        Ok(match self {
            Self::SetupEnvironment => Box::new(SetupEnvironment::new(binding)),
            Self::CreateEnvironment => Box::new(CreateEnvironment::new(binding)),
            Self::InstallTempest => Box::new(InstallTempest::new(binding)),
            Self::InstallArgusCi => Box::new(InstallArgusCi::new(binding)),
        })
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a task derives its binding from
#[derive(Clone)]
pub struct ProvisionContext {
    pub args: Arc<ProvisionArgs>,
    pub settings: Arc<Settings>,
    pub spawner: Arc<dyn ProcessSpawner>,
    pub platform: Platform,
}

/// State shared by every task: arguments, retry policy and venv layout
pub struct TaskBinding {
    args: Arc<ProvisionArgs>,
    settings: Arc<Settings>,
    executor: CommandExecutor,
    platform: Platform,
    setup_venv: bool,
    venv: Option<PathBuf>,
    python: PathBuf,
    pip: PathBuf,
}

impl TaskBinding {
    pub fn bind(context: &ProvisionContext) -> ArestorResult<Self> {
        let args = context.args.clone();
        let settings = context.settings.clone();
        let retry = RetryPolicy::new(args.attempts, args.retry_interval)?;
        let venv = args.build.as_ref().map(|build| settings.venv_base.join(build));

        let (python, pip) = if args.setup_venv {
            let venv = venv.as_ref().ok_or_else(|| {
                ArestorError::Config(
                    "A build identifier is required to set up a virtual environment".to_string(),
                )
            })?;
            let bin = venv.join(context.platform.venv_bin_dir());
            let suffix = context.platform.exe_suffix();
            (
                bin.join(format!("python{}", suffix)),
                bin.join(format!("pip{}", suffix)),
            )
        } else {
            (settings.system_python.clone(), settings.system_pip.clone())
        };

        Ok(Self {
            executor: CommandExecutor::new(context.spawner.clone(), retry),
            setup_venv: args.setup_venv,
            platform: context.platform,
            args,
            settings,
            venv,
            python,
            pip,
        })
    }

    pub fn args(&self) -> &ProvisionArgs {
        &self.args
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn setup_venv(&self) -> bool {
        self.setup_venv
    }

    pub fn venv(&self) -> Option<&Path> {
        self.venv.as_deref()
    }

    /// The venv root, for tasks that cannot do anything without one
    pub fn require_venv(&self, task: &str) -> ArestorResult<&Path> {
        self.venv().ok_or_else(|| {
            ArestorError::Task(format!("{} requires a build identifier", task))
        })
    }

    pub fn python(&self) -> &Path {
        &self.python
    }

    pub fn pip(&self) -> &Path {
        &self.pip
    }

    /// Run `command` with the default options
    pub fn execute<S: AsRef<str>>(&self, command: &[S]) -> ArestorResult<ProcessOutput> {
        self.executor.run(command)
    }

    /// Run `command` as the configured user through `sudo -u`
    pub fn execute_as_user<S: AsRef<str>>(&self, command: &[S]) -> ArestorResult<ProcessOutput> {
        let mut full = vec![
            "sudo".to_string(),
            "-u".to_string(),
            self.args.user.clone(),
        ];
        full.extend(command.iter().map(|part| part.as_ref().to_string()));
        self.executor.run(&full)
    }

    /// Install `requirement` with the task's pip, as the configured user
    pub fn pip_install(&self, requirement: &str) -> ArestorResult<ProcessOutput> {
        let pip = self.pip.display().to_string();
        self.execute_as_user(&[pip.as_str(), "install", requirement])
    }

    /// Check that `module` can be imported by the task's interpreter
    pub fn verify_import(&self, module: &str) -> ArestorResult<ProcessOutput> {
        let python = self.python.display().to_string();
        let statement = format!("import {}", module);
        self.execute_as_user(&[python.as_str(), "-c", statement.as_str()])
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::testing::{context, venv_args};
    use super::*;
    use crate::execution::process::testing::ScriptedSpawner;

    #[test]
    fn test_venv_layout_with_setup_venv() {
        let spawner = Arc::new(ScriptedSpawner::new());
        let binding =
            TaskBinding::bind(&context(&spawner, venv_args("build-42"), Settings::default()))
                .unwrap();

        assert_eq!(binding.venv(), Some(Path::new("/tmp/argus-env/build-42")));
        assert_eq!(binding.python(), Path::new("/tmp/argus-env/build-42/bin/python"));
        assert_eq!(binding.pip(), Path::new("/tmp/argus-env/build-42/bin/pip"));
        assert!(binding.setup_venv());
    }

    #[test]
    fn test_windows_venv_layout() {
        let spawner = Arc::new(ScriptedSpawner::new());
        let mut ctx = context(&spawner, venv_args("b1"), Settings::default());
        ctx.platform = Platform::Windows;

        let binding = TaskBinding::bind(&ctx).unwrap();
        assert_eq!(
            binding.pip(),
            Path::new("/tmp/argus-env/b1").join("Scripts").join("pip.exe")
        );
    }

    #[test]
    fn test_system_interpreter_without_venv() {
        let spawner = Arc::new(ScriptedSpawner::new());
        let binding = TaskBinding::bind(&context(
            &spawner,
            ProvisionArgs::default(),
            Settings::default(),
        ))
        .unwrap();

        assert_eq!(binding.python(), Path::new("/usr/bin/python"));
        assert_eq!(binding.pip(), Path::new("/usr/local/bin/pip"));
        assert_eq!(binding.venv(), None);
        assert!(binding.require_venv("InstallTempest").is_err());
    }

    #[test]
    fn test_setup_venv_requires_build() {
        let spawner = Arc::new(ScriptedSpawner::new());
        let args = ProvisionArgs {
            setup_venv: true,
            ..ProvisionArgs::default()
        };
        let result = TaskBinding::bind(&context(&spawner, args, Settings::default()));
        assert!(matches!(result, Err(ArestorError::Config(_))));
    }

    #[test]
    fn test_zero_attempts_fails_binding() {
        let spawner = Arc::new(ScriptedSpawner::new());
        let args = ProvisionArgs {
            attempts: 0,
            ..ProvisionArgs::default()
        };
        assert!(TaskBinding::bind(&context(&spawner, args, Settings::default())).is_err());
    }

    #[test]
    fn test_execute_as_user_prefixes_sudo() {
        let spawner = Arc::new(ScriptedSpawner::new());
        let binding =
            TaskBinding::bind(&context(&spawner, venv_args("b2"), Settings::default())).unwrap();

        binding.verify_import("tempest").unwrap();
        assert_eq!(
            spawner.joined_calls(),
            vec!["sudo -u jenkins /tmp/argus-env/b2/bin/python -c import tempest"]
        );
    }

    #[test]
    fn test_prerequisites() {
        assert!(TaskKind::SetupEnvironment.prerequisites().is_empty());
        assert_eq!(
            TaskKind::InstallTempest.prerequisites(),
            &[TaskKind::CreateEnvironment]
        );
        assert_eq!(TaskKind::InstallArgusCi.to_string(), "InstallArgusCi");
    }
}
