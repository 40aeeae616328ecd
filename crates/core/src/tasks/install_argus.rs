use crate::lifecycle::Lifecycle;
use crate::tasks::TaskBinding;
use crate::types::ArestorResult;

const REPO: &str = "git+https://github.com/cloudbase/cloudbase-init-ci";

/// Installs the Argus-CI framework and its requirements
pub struct InstallArgusCi {
    binding: TaskBinding,
}

impl InstallArgusCi {
    pub fn new(binding: TaskBinding) -> Self {
        Self { binding }
    }
}

impl Lifecycle for InstallArgusCi {
    fn name(&self) -> &'static str {
        "InstallArgusCi"
    }

    fn work(&mut self) -> ArestorResult<Option<String>> {
        let requirement = format!("{}@{}", REPO, self.binding.args().argus_branch);
        self.binding.pip_install(&requirement)?;
        Ok(None)
    }

    fn epilogue(&mut self) -> ArestorResult<()> {
        self.binding.verify_import("argus")?;
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
    use crate::platform::Platform;
    use crate::tasks::testing::context;

    struct Hooks;

    impl TaskHooks for Hooks {
        fn owner_name(&self) -> &str {
            "tests"
        }
    }

    #[test]
    fn test_installs_requested_branch() {
        let spawner = Arc::new(ScriptedSpawner::new());
        let args = ProvisionArgs {
            argus_branch: "feature/x".to_string(),
            ..ProvisionArgs::default()
        };
        let binding = TaskBinding::bind(&context(&spawner, args, Settings::default())).unwrap();

        let outcome = InstallArgusCi::new(binding).run(Platform::Posix, &mut Hooks);

        assert_eq!(outcome, RunOutcome::Completed(None));
        assert_eq!(
            spawner.joined_calls(),
            vec![
                "sudo -u root /usr/local/bin/pip install git+https://github.com/cloudbase/cloudbase-init-ci@feature/x",
                "sudo -u root /usr/bin/python -c import argus",
            ]
        );
    }

    #[test]
    fn test_retries_flaky_install() {
        let spawner = Arc::new(ScriptedSpawner::new().codes(&[1, 0, 0]));
        let args = ProvisionArgs {
            attempts: 2,
            ..ProvisionArgs::default()
        };
        let binding = TaskBinding::bind(&context(&spawner, args, Settings::default())).unwrap();

        let outcome = InstallArgusCi::new(binding).run(Platform::Posix, &mut Hooks);

        assert_eq!(outcome, RunOutcome::Completed(None));
        assert_eq!(spawner.calls().len(), 3);
    }
}
