//! Task lifecycle
//!
//! Every provisioning task runs through the same three phases: `prologue`,
//! `work` and `epilogue`. [`Lifecycle::run`] drives them in order, picks the
//! platform specific variant of each phase from the task's [`RouteTable`] and
//! reports the outcome to the owner through [`TaskHooks`] instead of returning
//! an error.

use tracing::{debug, warn};

use crate::platform::Platform;
use crate::types::{ArestorError, ArestorResult};

/// Which implementation of a phase runs on a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The phase method itself
    Base,
    /// The `*_override` method
    Override,
    /// Nothing runs. When the work phase is unsupported the whole task is skipped.
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseRoutes {
    pub prologue: Route,
    pub work: Route,
    pub epilogue: Route,
}

impl PhaseRoutes {
    pub const BASE: Self = Self {
        prologue: Route::Base,
        work: Route::Base,
        epilogue: Route::Base,
    };

    pub const OVERRIDE: Self = Self {
        prologue: Route::Override,
        work: Route::Override,
        epilogue: Route::Override,
    };

    pub const UNSUPPORTED: Self = Self {
        prologue: Route::Unsupported,
        work: Route::Unsupported,
        epilogue: Route::Unsupported,
    };
}

impl Default for PhaseRoutes {
    fn default() -> Self {
        Self::BASE
    }
}

/// Phase routes for the two platform families
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteTable {
    pub posix: PhaseRoutes,
    pub windows: PhaseRoutes,
}

impl RouteTable {
    pub fn with_posix(mut self, routes: PhaseRoutes) -> Self {
        self.posix = routes;
        self
    }

    pub fn with_windows(mut self, routes: PhaseRoutes) -> Self {
        self.windows = routes;
        self
    }

    pub fn for_platform(&self, platform: Platform) -> PhaseRoutes {
        match platform {
            Platform::Posix => self.posix,
            Platform::Windows => self.windows,
        }
    }
}

/// How a single [`Lifecycle::run`] ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// All phases ran; carries whatever `work` returned
    Completed(Option<String>),
    /// A phase failed and the owner was notified through `on_task_fail`
    Failed,
    /// The task has no work phase for the current platform
    Skipped,
}

impl RunOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Callbacks the owner of a task receives.
///
/// Both callbacks are optional: the default implementations only note that
/// the owner did not register one.
pub trait TaskHooks {
    fn owner_name(&self) -> &str;

    fn on_task_done(&mut self, task: &str, _output: Option<&str>) {
        debug!(
            "{:?}: No callback found for task_done in {:?}",
            task,
            self.owner_name()
        );
    }

    fn on_task_fail(&mut self, task: &str, _error: &ArestorError) {
        debug!(
            "{:?}: No callback found for task_fail in {:?}",
            task,
            self.owner_name()
        );
    }
}

/// The prologue/work/epilogue contract every task implements
pub trait Lifecycle {
    /// Name used in logs and failure reports
    fn name(&self) -> &'static str;

    fn routes(&self) -> RouteTable {
        RouteTable::default()
    }

    /// Executed once before the work phase
    fn prologue(&mut self) -> ArestorResult<()> {
        debug!("{:?} in prologue section", self.name());
        Ok(())
    }

    /// The task's own procedure
    fn work(&mut self) -> ArestorResult<Option<String>>;

    /// Executed once after a successful work phase
    fn epilogue(&mut self) -> ArestorResult<()> {
        debug!("{:?} in epilogue section", self.name());
        Ok(())
    }

    fn prologue_override(&mut self, _platform: Platform) -> ArestorResult<()> {
        self.prologue()
    }

    fn work_override(&mut self, _platform: Platform) -> ArestorResult<Option<String>> {
        self.work()
    }

    fn epilogue_override(&mut self, _platform: Platform) -> ArestorResult<()> {
        self.epilogue()
    }

    /// Run all phases for `platform` and report the result to `hooks`
    fn run(&mut self, platform: Platform, hooks: &mut dyn TaskHooks) -> RunOutcome {
        let routes = self.routes().for_platform(platform);
        if routes.work == Route::Unsupported {
            warn!("{} not available on {}", self.name(), platform);
            return RunOutcome::Skipped;
        }

        match run_phases(self, platform, routes) {
            Ok(output) => {
                hooks.on_task_done(self.name(), output.as_deref());
                RunOutcome::Completed(output)
            }
            Err(error) => {
                hooks.on_task_fail(self.name(), &error);
                RunOutcome::Failed
            }
        }
    }
}

fn run_phases<T: Lifecycle + ?Sized>(
    task: &mut T,
    platform: Platform,
    routes: PhaseRoutes,
) -> ArestorResult<Option<String>> {
    match routes.prologue {
        Route::Base => task.prologue()?,
        Route::Override => task.prologue_override(platform)?,
        Route::Unsupported => {}
    }

    let output = match routes.work {
        Route::Base => task.work()?,
        Route::Override => task.work_override(platform)?,
        Route::Unsupported => None,
    };

    match routes.epilogue {
        Route::Base => task.epilogue()?,
        Route::Override => task.epilogue_override(platform)?,
        Route::Unsupported => {}
    }

    Ok(output)
}
