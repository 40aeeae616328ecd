use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{ArestorError, ArestorResult};

/// Defaults shared by every provisioning action, read from an optional YAML file
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Settings {
    /// How many times a failing command is run before giving up
    pub attempts: u32,
    /// Seconds to wait between two attempts of the same command
    pub retry_interval: u64,
    /// Directory under which the per-build virtual environments are created
    pub venv_base: PathBuf,
    /// Interpreter the virtual environment is created with
    pub interpreter: String,
    pub system_python: PathBuf,
    pub system_pip: PathBuf,
    /// Tempest config template; the embedded sample is used when unset
    pub tempest_template: Option<PathBuf>,
    pub image_pattern: String,
    pub flavor: String,
    pub public_network: String,
    pub router: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            attempts: 1,
            retry_interval: 0,
            venv_base: PathBuf::from("/tmp/argus-env"),
            interpreter: "/usr/bin/python2.7".to_string(),
            system_python: PathBuf::from("/usr/bin/python"),
            system_pip: PathBuf::from("/usr/local/bin/pip"),
            tempest_template: None,
            image_pattern: "argus.*".to_string(),
            flavor: "m1.large".to_string(),
            public_network: "public".to_string(),
            router: "router1".to_string(),
        }
    }
}

pub fn parse_settings(yaml_str: &str) -> ArestorResult<Settings> {
    let settings: Settings = serde_yaml::from_str(yaml_str)?;
    if settings.attempts == 0 {
        return Err(ArestorError::Config(
            "attempts must be at least 1".to_string(),
        ));
    }
    Ok(settings)
}

/// Load settings from `path`, or return the defaults when no path is given
pub fn load_settings(path: Option<&Path>) -> ArestorResult<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };

    let content = fs::read_to_string(path).map_err(|e| {
        ArestorError::Config(format!(
            "Failed to read settings {}: {}",
            path.display(),
            e
        ))
    })?;
    parse_settings(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = parse_settings("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.venv_base, PathBuf::from("/tmp/argus-env"));
    }

    #[test]
    fn test_partial_override() {
        let settings = parse_settings("attempts: 3\nretryInterval: 5\nvenvBase: /opt/envs\n").unwrap();
        assert_eq!(settings.attempts, 3);
        assert_eq!(settings.retry_interval, 5);
        assert_eq!(settings.venv_base, PathBuf::from("/opt/envs"));
        assert_eq!(settings.flavor, "m1.large");
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = parse_settings("attempts: 0\n").unwrap_err();
        assert!(matches!(err, ArestorError::Config(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(parse_settings("retries: 2\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arestor.yml");
        fs::write(&path, "imagePattern: \"win.*\"\n").unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.image_pattern, "win.*");
        assert_eq!(load_settings(None).unwrap(), Settings::default());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings(Some(&dir.path().join("missing.yml"))).unwrap_err();
        assert!(matches!(err, ArestorError::Config(_)));
    }
}
