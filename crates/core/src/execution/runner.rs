//! Task runner
//!
//! Runs an ordered sequence of tasks one after another and stops scheduling
//! new ones after the first failure.

use tracing::{error, info, info_span};

use crate::execution::dependencies::order_tasks;
use crate::lifecycle::TaskHooks;
use crate::tasks::{ProvisionContext, TaskKind};
use crate::types::{ArestorError, ArestorResult};

/// Runs tasks in order, building each one right before it runs
pub struct TaskRunner {
    name: String,
    tasks: Vec<TaskKind>,
    context: ProvisionContext,
    success: bool,
}

impl TaskRunner {
    /// Create a runner for `tasks`, reordered so that prerequisites run first
    pub fn new(
        name: impl Into<String>,
        tasks: &[TaskKind],
        context: ProvisionContext,
    ) -> ArestorResult<Self> {
        Ok(Self {
            name: name.into(),
            tasks: order_tasks(tasks)?,
            context,
            success: true,
        })
    }

    pub fn tasks(&self) -> &[TaskKind] {
        &self.tasks
    }

    /// False once any task failed
    pub fn succeeded(&self) -> bool {
        self.success
    }

    /// Run the sequence and return whether every task succeeded
    pub fn run(&mut self) -> bool {
        let span = info_span!("runner", name = %self.name);
        let _enter = span.enter();

        let tasks = self.tasks.clone();
        for kind in tasks {
            if !self.success {
                break;
            }
            self.run_task(kind);
        }
        self.success
    }

    fn run_task(&mut self, kind: TaskKind) {
        let platform = self.context.platform;
        match kind.build(&self.context) {
            Ok(mut task) => {
                task.run(platform, self);
            }
            Err(error) => self.on_task_fail(kind.name(), &error),
        }
    }
}

impl TaskHooks for TaskRunner {
    fn owner_name(&self) -> &str {
        &self.name
    }

    fn on_task_done(&mut self, task: &str, output: Option<&str>) {
        match output {
            Some(output) => info!("Task {} done: {}", task, output),
            None => info!("Task {} done", task),
        }
    }

    fn on_task_fail(&mut self, task: &str, error: &ArestorError) {
        self.success = false;
        error!("Task {} failed: {}", task, error);
    }
}
