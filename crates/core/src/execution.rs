//! Task execution module
//!
//! This module handles the actual execution of tasks including process
//! spawning, retrying command execution, prerequisite ordering and the
//! fail-fast task runner.

pub mod command;
pub mod dependencies;
pub mod process;
pub mod runner;

pub use command::{CheckExitCode, CommandExecutor, ExecOptions, ProcessOutput, RetryPolicy};
pub use dependencies::order_tasks;
pub use process::{ProcessSpawner, SystemSpawner};
pub use runner::TaskRunner;
