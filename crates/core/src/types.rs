use thiserror::Error;

/// The main error type for arestor operations
#[derive(Debug, Error)]
pub enum ArestorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task error: {0}")]
    Task(String),

    #[error("Failed to spawn {command:?}: {source}")]
    Spawn {
        command: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    #[error("Command {command:?} failed with return code {return_code}")]
    CommandFailed {
        command: Vec<String>,
        return_code: i32,
        stdout: String,
        stderr: String,
    },
}

/// Result type alias for arestor operations
pub type ArestorResult<T> = Result<T, ArestorError>;
