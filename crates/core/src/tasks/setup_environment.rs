use crate::lifecycle::{Lifecycle, PhaseRoutes, RouteTable};
use crate::tasks::TaskBinding;
use crate::types::ArestorResult;

/// Installs the system packages every Argus-CI machine needs
pub struct SetupEnvironment {
    binding: TaskBinding,
}

impl SetupEnvironment {
    pub fn new(binding: TaskBinding) -> Self {
        Self { binding }
    }
}

impl Lifecycle for SetupEnvironment {
    fn name(&self) -> &'static str {
        "SetupEnvironment"
    }

    // apt-get only exists on the Linux workers.
    fn routes(&self) -> RouteTable {
        RouteTable::default().with_windows(PhaseRoutes::UNSUPPORTED)
    }

    fn work(&mut self) -> ArestorResult<Option<String>> {
        self.binding.execute(&[
            "sudo",
            "apt-get",
            "install",
            "-y",
            "build-essential",
            "git",
            "python-dev",
            "libffi-dev",
            "libssl-dev",
        ])?;
        self.binding
            .execute(&["sudo", "apt-get", "install", "-y", "python-pip"])?;
        self.binding
            .execute(&["sudo", "pip", "install", "virtualenv"])?;
        Ok(None)
    }
}
