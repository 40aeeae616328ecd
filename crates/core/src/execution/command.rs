//! Command execution utilities
//!
//! This module provides the retrying command executor every provisioning task
//! shells out through, along with the policies that decide when a command
//! counted as successful and how often it is retried.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::execution::process::{ProcessSpawner, RawOutput, SpawnRequest};
use crate::types::{ArestorError, ArestorResult};

/// Which return codes count as success
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckExitCode {
    /// Every return code is accepted
    Ignore,
    Codes(BTreeSet<i32>),
}

impl CheckExitCode {
    pub fn accepts(&self, return_code: i32) -> bool {
        match self {
            Self::Ignore => true,
            Self::Codes(codes) => codes.contains(&return_code),
        }
    }
}

impl Default for CheckExitCode {
    fn default() -> Self {
        Self::Codes(BTreeSet::from([0]))
    }
}

impl From<bool> for CheckExitCode {
    /// `false` disables the check, `true` keeps the default of accepting only 0
    fn from(check: bool) -> Self {
        if check {
            Self::default()
        } else {
            Self::Ignore
        }
    }
}

impl From<i32> for CheckExitCode {
    fn from(code: i32) -> Self {
        Self::Codes(BTreeSet::from([code]))
    }
}

impl From<&[i32]> for CheckExitCode {
    fn from(codes: &[i32]) -> Self {
        Self::Codes(codes.iter().copied().collect())
    }
}

impl From<Vec<i32>> for CheckExitCode {
    fn from(codes: Vec<i32>) -> Self {
        Self::Codes(codes.into_iter().collect())
    }
}

/// How many times a command runs and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    retry_interval: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, retry_interval: Duration) -> ArestorResult<Self> {
        if attempts == 0 {
            return Err(ArestorError::Config(
                "attempts must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            attempts,
            retry_interval,
        })
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            retry_interval: Duration::ZERO,
        }
    }
}

/// Captured output of one stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamData {
    Text(String),
    Binary(Vec<u8>),
}

impl StreamData {
    fn from_raw(bytes: Vec<u8>, binary: bool) -> Self {
        if binary {
            Self::Binary(bytes)
        } else {
            // Invalid sequences are replaced, decoding never fails.
            Self::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
    }

    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Binary(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }
}

/// Result of a successful [`CommandExecutor::execute`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub return_code: i32,
    pub stdout: StreamData,
    pub stderr: StreamData,
}

/// Per-call options; unset values fall back to the executor's retry policy
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    pub attempts: Option<u32>,
    pub check_exit_code: CheckExitCode,
    pub retry_interval: Option<Duration>,
    pub cwd: Option<PathBuf>,
    pub env_variables: Option<BTreeMap<String, String>>,
    pub shell: bool,
    pub binary: bool,
}

impl ExecOptions {
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn check_exit_code(mut self, check: impl Into<CheckExitCode>) -> Self {
        self.check_exit_code = check.into();
        self
    }

    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = Some(interval);
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_variables
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Run through the platform shell; see [`SpawnRequest::shell`]
    pub fn shell(mut self) -> Self {
        self.shell = true;
        self
    }

    pub fn binary(mut self) -> Self {
        self.binary = true;
        self
    }
}

/// Runs external commands, retrying the ones whose return code is rejected
#[derive(Clone)]
pub struct CommandExecutor {
    spawner: Arc<dyn ProcessSpawner>,
    retry: RetryPolicy,
}

impl CommandExecutor {
    pub fn new(spawner: Arc<dyn ProcessSpawner>, retry: RetryPolicy) -> Self {
        Self { spawner, retry }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Execute a command with the default options
    pub fn run<S: AsRef<str>>(&self, command: &[S]) -> ArestorResult<ProcessOutput> {
        self.execute(command, &ExecOptions::default())
    }

    /// Execute a command, retrying up to `attempts` times while its return
    /// code is rejected by `check_exit_code`.
    ///
    /// A process that cannot be started at all fails immediately with
    /// [`ArestorError::Spawn`].
    pub fn execute<S: AsRef<str>>(
        &self,
        command: &[S],
        options: &ExecOptions,
    ) -> ArestorResult<ProcessOutput> {
        let command: Vec<String> = command.iter().map(|part| part.as_ref().to_string()).collect();
        if command.is_empty() {
            return Err(ArestorError::Config("Cannot execute an empty command".to_string()));
        }

        let attempts = options.attempts.unwrap_or(self.retry.attempts);
        if attempts == 0 {
            return Err(ArestorError::Config(
                "attempts must be at least 1".to_string(),
            ));
        }
        let retry_interval = options.retry_interval.unwrap_or(self.retry.retry_interval);

        let cwd = match &options.cwd {
            Some(cwd) if !cwd.is_dir() => {
                warn!("Invalid value for cwd: {}", cwd.display());
                None
            }
            other => other.as_deref(),
        };

        let request = SpawnRequest {
            command: &command,
            cwd,
            env: options.env_variables.as_ref(),
            shell: options.shell,
        };

        let mut attempt = 1;
        loop {
            debug!("Execute command: {:?} (attempt {})", command, attempt);
            let RawOutput {
                return_code,
                stdout,
                stderr,
            } = self
                .spawner
                .spawn(&request)
                .map_err(|source| ArestorError::Spawn {
                    command: command.clone(),
                    source,
                })?;
            debug!("{:?} (return code {})", command, return_code);

            if options.check_exit_code.accepts(return_code) {
                return Ok(ProcessOutput {
                    return_code,
                    stdout: StreamData::from_raw(stdout, options.binary),
                    stderr: StreamData::from_raw(stderr, options.binary),
                });
            }

            if attempt >= attempts {
                return Err(ArestorError::CommandFailed {
                    command,
                    return_code,
                    stdout: String::from_utf8_lossy(&stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                });
            }

            attempt += 1;
            thread::sleep(retry_interval);
        }
    }
}
