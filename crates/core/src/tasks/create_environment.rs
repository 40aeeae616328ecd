use tracing::warn;

use crate::lifecycle::{Lifecycle, PhaseRoutes, Route, RouteTable};
use crate::platform::Platform;
use crate::tasks::TaskBinding;
use crate::types::ArestorResult;

/// Creates the per-build virtual environment Argus-CI and Tempest live in
pub struct CreateEnvironment {
    binding: TaskBinding,
}

impl CreateEnvironment {
    pub fn new(binding: TaskBinding) -> Self {
        Self { binding }
    }

    /// The venv to create, or `None` when there is nothing to do
    fn pending_venv(&self) -> ArestorResult<Option<String>> {
        if !self.binding.setup_venv() {
            return Ok(None);
        }

        let venv = self.binding.require_venv(self.name())?;
        if venv.is_dir() {
            warn!("The virtual environment already exists. {}", venv.display());
            return Ok(None);
        }
        Ok(Some(venv.display().to_string()))
    }
}

impl Lifecycle for CreateEnvironment {
    fn name(&self) -> &'static str {
        "CreateEnvironment"
    }

    // No sudo on Windows; virtualenv is driven through the interpreter.
    fn routes(&self) -> RouteTable {
        RouteTable::default().with_windows(PhaseRoutes {
            prologue: Route::Base,
            ..PhaseRoutes::OVERRIDE
        })
    }

    fn work(&mut self) -> ArestorResult<Option<String>> {
        let Some(venv) = self.pending_venv()? else {
            return Ok(None);
        };

        let interpreter = self.binding.settings().interpreter.clone();
        self.binding.execute_as_user(&[
            "virtualenv",
            venv.as_str(),
            "--python",
            interpreter.as_str(),
        ])?;
        Ok(Some(venv))
    }

    fn epilogue(&mut self) -> ArestorResult<()> {
        if self.binding.setup_venv() {
            let pip = self.binding.pip().display().to_string();
            self.binding
                .execute_as_user(&[pip.as_str(), "install", "pip", "--upgrade"])?;
        }
        Ok(())
    }

    fn work_override(&mut self, _platform: Platform) -> ArestorResult<Option<String>> {
        let Some(venv) = self.pending_venv()? else {
            return Ok(None);
        };

        let interpreter = self.binding.settings().interpreter.clone();
        self.binding
            .execute(&[interpreter.as_str(), "-m", "virtualenv", venv.as_str()])?;
        Ok(Some(venv))
    }

    fn epilogue_override(&mut self, _platform: Platform) -> ArestorResult<()> {
        if self.binding.setup_venv() {
            let python = self.binding.python().display().to_string();
            self.binding.execute(&[
                python.as_str(),
                "-m",
                "pip",
                "install",
                "pip",
                "--upgrade",
            ])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::configs::{ProvisionArgs, Settings};
    use crate::execution::process::testing::ScriptedSpawner;
    use crate::lifecycle::{RunOutcome, TaskHooks};
    use crate::tasks::testing::{context, venv_args};

    struct Hooks;

    impl TaskHooks for Hooks {
        fn owner_name(&self) -> &str {
            "tests"
        }
    }

    fn task(spawner: &Arc<ScriptedSpawner>, args: ProvisionArgs, settings: Settings) -> CreateEnvironment {
        CreateEnvironment::new(TaskBinding::bind(&context(spawner, args, settings)).unwrap())
    }

    #[test]
    fn test_creates_missing_venv_and_upgrades_pip() {
        let base = tempfile::tempdir().unwrap();
        let settings = Settings {
            venv_base: base.path().to_path_buf(),
            ..Settings::default()
        };
        let spawner = Arc::new(ScriptedSpawner::new());
        let venv = base.path().join("build-7");

        let outcome = task(&spawner, venv_args("build-7"), settings).run(Platform::Posix, &mut Hooks);

        assert_eq!(outcome, RunOutcome::Completed(Some(venv.display().to_string())));
        assert_eq!(
            spawner.joined_calls(),
            vec![
                format!(
                    "sudo -u jenkins virtualenv {} --python /usr/bin/python2.7",
                    venv.display()
                ),
                format!(
                    "sudo -u jenkins {} install pip --upgrade",
                    venv.join("bin").join("pip").display()
                ),
            ]
        );
    }

    #[test]
    fn test_existing_venv_is_not_recreated() {
        let base = tempfile::tempdir().unwrap();
        std::fs::create_dir(base.path().join("build-8")).unwrap();
        let settings = Settings {
            venv_base: base.path().to_path_buf(),
            ..Settings::default()
        };
        let spawner = Arc::new(ScriptedSpawner::new());

        let mut create = task(&spawner, venv_args("build-8"), settings);
        assert_eq!(create.work().unwrap(), None);
        assert!(spawner.calls().is_empty());
    }

    #[test]
    fn test_noop_without_setup_venv() {
        let spawner = Arc::new(ScriptedSpawner::new());
        let outcome = task(&spawner, ProvisionArgs::default(), Settings::default())
            .run(Platform::Posix, &mut Hooks);

        assert_eq!(outcome, RunOutcome::Completed(None));
        assert!(spawner.calls().is_empty());
    }

    #[test]
    fn test_windows_uses_interpreter_module() {
        let base = tempfile::tempdir().unwrap();
        let settings = Settings {
            venv_base: base.path().to_path_buf(),
            interpreter: "python".to_string(),
            ..Settings::default()
        };
        let spawner = Arc::new(ScriptedSpawner::new());

        task(&spawner, venv_args("win-1"), settings).run(Platform::Windows, &mut Hooks);

        let calls = spawner.joined_calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("python -m virtualenv "));
        assert!(calls[1].ends_with("-m pip install pip --upgrade"));
        assert!(calls.iter().all(|call| !call.starts_with("sudo")));
    }
}
