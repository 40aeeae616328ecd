//! Process spawning
//!
//! Every side effect the provisioning tasks have on the machine goes through a
//! [`ProcessSpawner`]. The [`SystemSpawner`] runs real OS processes; tests swap
//! in a scripted implementation.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// A single process launch
#[derive(Debug, Clone, Copy)]
pub struct SpawnRequest<'a> {
    pub command: &'a [String],
    pub cwd: Option<&'a Path>,
    /// Variables set on top of the inherited environment
    pub env: Option<&'a BTreeMap<String, String>>,
    /// Run the command through the platform shell. A single token is handed
    /// to the shell as a whole command line; several tokens are quoted so
    /// each one reaches the program as one argument.
    pub shell: bool,
}

/// What a finished process left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub return_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

pub trait ProcessSpawner: Send + Sync {
    /// Run the process to completion with no input and captured output.
    ///
    /// An `Err` means the process could not be started at all; a non-zero
    /// return code is reported through [`RawOutput::return_code`].
    fn spawn(&self, request: &SpawnRequest<'_>) -> io::Result<RawOutput>;
}

/// Spawns real processes with `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpawner;

impl SystemSpawner {
    fn build_command(request: &SpawnRequest<'_>) -> io::Result<Command> {
        let mut command = if request.shell {
            let line = shell_line(request.command);
            let mut command = if cfg!(windows) {
                let mut command = Command::new("cmd");
                command.arg("/C");
                command
            } else {
                let mut command = Command::new("sh");
                command.arg("-c");
                command
            };
            command.arg(line);
            command
        } else {
            let (program, args) = request
                .command
                .split_first()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;
            let mut command = Command::new(program);
            command.args(args);
            command
        };

        if let Some(cwd) = request.cwd {
            command.current_dir(cwd);
        }
        if let Some(env) = request.env {
            command.envs(env);
        }

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        Ok(command)
    }
}

fn shell_line(command: &[String]) -> String {
    match command {
        [line] => line.clone(),
        tokens => tokens
            .iter()
            .map(|token| quote(token))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[cfg(not(windows))]
fn quote(token: &str) -> String {
    let plain = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:,+@%".contains(c));
    if plain {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}

#[cfg(windows)]
fn quote(token: &str) -> String {
    if !token.is_empty() && !token.contains([' ', '\t', '"']) {
        token.to_string()
    } else {
        format!("\"{}\"", token.replace('"', "\\\""))
    }
}

impl ProcessSpawner for SystemSpawner {
    fn spawn(&self, request: &SpawnRequest<'_>) -> io::Result<RawOutput> {
        let output = Self::build_command(request)?.output()?;
        Ok(RawOutput {
            return_code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn strings(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_system_spawner_captures_output() {
        let command = strings(&["sh", "-c", "printf out; printf err >&2; exit 3"]);
        let output = SystemSpawner
            .spawn(&SpawnRequest {
                command: &command,
                cwd: None,
                env: None,
                shell: false,
            })
            .unwrap();

        assert_eq!(output.return_code, 3);
        assert_eq!(output.stdout, b"out");
        assert_eq!(output.stderr, b"err");
    }

    #[test]
    fn test_system_spawner_shell_env_and_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = BTreeMap::new();
        env.insert("ARESTOR_PROBE".to_string(), "probe".to_string());
        let command = strings(&["echo $ARESTOR_PROBE && pwd"]);

        let output = SystemSpawner
            .spawn(&SpawnRequest {
                command: &command,
                cwd: Some(dir.path()),
                env: Some(&env),
                shell: true,
            })
            .unwrap();

        let stdout = String::from_utf8(output.stdout).unwrap();
        let mut lines = stdout.lines();
        assert_eq!(lines.next(), Some("probe"));
        let cwd = std::path::PathBuf::from(lines.next().unwrap());
        assert_eq!(cwd.canonicalize().unwrap(), dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_shell_tokens_keep_their_boundaries() {
        let command = strings(&["printf", "%s|", "a b", "it's", "$HOME"]);
        let output = SystemSpawner
            .spawn(&SpawnRequest {
                command: &command,
                cwd: None,
                env: None,
                shell: true,
            })
            .unwrap();

        assert_eq!(output.return_code, 0);
        assert_eq!(output.stdout, b"a b|it's|$HOME|");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("virtualenv"), "virtualenv");
        assert_eq!(quote("a b"), "'a b'");
        assert_eq!(quote("it's"), r"'it'\''s'");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let command = strings(&["/nonexistent/arestor-probe"]);
        let result = SystemSpawner.spawn(&SpawnRequest {
            command: &command,
            cwd: None,
            env: None,
            shell: false,
        });
        assert!(result.is_err());
    }
}
