//! OpenStack lookups needed to fill in the Tempest configuration
//!
//! The lookups shell out to the `glance` and `openstack` command-line clients
//! through the [`CommandExecutor`], so they share the retry policy of the task
//! that owns them.

use std::collections::BTreeMap;
use std::env;

use regex::Regex;
use tracing::debug;

use crate::execution::command::{CommandExecutor, ExecOptions};
use crate::types::ArestorResult;

/// Credentials the OpenStack clients authenticate with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub tenant_name: Option<String>,
    pub auth_url: Option<String>,
}

impl Credentials {
    /// Read `OS_USERNAME`, `OS_PASSWORD`, `OS_TENANT_NAME` and `OS_AUTH_URL`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            username: lookup("OS_USERNAME"),
            password: lookup("OS_PASSWORD"),
            tenant_name: lookup("OS_TENANT_NAME"),
            auth_url: lookup("OS_AUTH_URL"),
        }
    }

    /// Lookups are only possible once the identity endpoint is known
    pub fn is_complete(&self) -> bool {
        self.auth_url.is_some()
    }

    fn env_variables(&self) -> BTreeMap<String, String> {
        [
            ("OS_USERNAME", &self.username),
            ("OS_PASSWORD", &self.password),
            ("OS_TENANT_NAME", &self.tenant_name),
            ("OS_AUTH_URL", &self.auth_url),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|value| (key.to_string(), value)))
        .collect()
    }
}

/// Client for the few cloud resources the Tempest config refers to
pub struct CloudLookup {
    executor: CommandExecutor,
    credentials: Credentials,
}

impl CloudLookup {
    pub fn new(executor: CommandExecutor, credentials: Credentials) -> Self {
        Self {
            executor,
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn query(&self, command: &[&str]) -> ArestorResult<String> {
        let options = ExecOptions {
            env_variables: Some(self.credentials.env_variables()),
            ..ExecOptions::default()
        };
        let output = self.executor.execute(command, &options)?;
        Ok(output.stdout.as_text().into_owned())
    }

    /// Identifier of the first image whose name matches `pattern` from its start
    pub fn image_id(&self, pattern: &str) -> ArestorResult<Option<String>> {
        let pattern = Regex::new(&format!("^(?:{})", pattern))?;
        let listing = self.query(&["glance", "image-list"])?;
        Ok(parse_image_list(&listing, &pattern))
    }

    /// Project the current credentials are scoped to
    pub fn tenant_id(&self) -> ArestorResult<Option<String>> {
        let output = self.query(&["openstack", "token", "issue", "-f", "value", "-c", "project_id"])?;
        Ok(first_line(&output))
    }

    pub fn network_id(&self, name: &str) -> ArestorResult<Option<String>> {
        let output = self.query(&[
            "openstack", "network", "list", "-f", "value", "-c", "ID", "-c", "Name",
        ])?;
        Ok(find_id_by_name(&output, name))
    }

    pub fn router_id(&self, name: &str) -> ArestorResult<Option<String>> {
        let output = self.query(&[
            "openstack", "router", "list", "-f", "value", "-c", "ID", "-c", "Name",
        ])?;
        Ok(find_id_by_name(&output, name))
    }

    /// CIDR of the first subnet of the network named `name`
    pub fn network_cidr(&self, name: &str) -> ArestorResult<Option<String>> {
        let Some(network_id) = self.network_id(name)? else {
            return Ok(None);
        };
        let output = self.query(&[
            "openstack",
            "subnet",
            "list",
            "--network",
            network_id.as_str(),
            "-f",
            "value",
            "-c",
            "CIDR",
        ])?;
        Ok(first_line(&output))
    }
}

/// Find the image id in `glance image-list` table output.
///
/// Border rows and rows without exactly two cells are skipped.
pub fn parse_image_list(listing: &str, pattern: &Regex) -> Option<String> {
    for line in listing.lines() {
        let row = line.trim_matches(|c: char| c == ' ' || c == '-' || c == '+' || c == '|');
        let cells: Vec<&str> = row.split('|').collect();
        let [image_id, image_name] = cells.as_slice() else {
            debug!("Skipping malformed image-list row: {:?}", line);
            continue;
        };

        if pattern.is_match(image_name.trim()) {
            return Some(image_id.trim().to_string());
        }
    }
    None
}

/// Match `ID Name` rows produced by `-f value -c ID -c Name`
fn find_id_by_name(output: &str, name: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (id, row_name) = line.trim().split_once(char::is_whitespace)?;
        (row_name.trim() == name).then(|| id.to_string())
    })
}

fn first_line(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::execution::command::RetryPolicy;
    use crate::execution::process::testing::ScriptedSpawner;

    const IMAGE_LIST: &str = "\
+--------------------------------------+-------------------+
| ID                                   | Name              |
+--------------------------------------+-------------------+
| 0b4d2ae2-0000-4000-8000-000000000001 | cirros            |
| 0b4d2ae2-0000-4000-8000-000000000002 | argus-windows-2012 |
| 0b4d2ae2-0000-4000-8000-000000000003 | argus-ubuntu      |
+--------------------------------------+-------------------+
";

    fn lookup(spawner: &Arc<ScriptedSpawner>) -> CloudLookup {
        CloudLookup::new(
            CommandExecutor::new(spawner.clone(), RetryPolicy::default()),
            Credentials {
                auth_url: Some("http://keystone:5000/v2.0".to_string()),
                ..Credentials::default()
            },
        )
    }

    #[test]
    fn test_parse_image_list_returns_first_match() {
        let pattern = Regex::new("^(?:argus.*)").unwrap();
        assert_eq!(
            parse_image_list(IMAGE_LIST, &pattern).as_deref(),
            Some("0b4d2ae2-0000-4000-8000-000000000002")
        );
    }

    #[test]
    fn test_parse_image_list_skips_malformed_rows() {
        let pattern = Regex::new("^(?:argus)").unwrap();
        let listing = "garbage\n| a | b | c |\n| id-1 | argus |\n";
        assert_eq!(parse_image_list(listing, &pattern).as_deref(), Some("id-1"));
        assert_eq!(parse_image_list("+----+\n", &pattern), None);
    }

    #[test]
    fn test_pattern_is_anchored_at_start() {
        let spawner = Arc::new(ScriptedSpawner::new().on("glance", 0, "| id-9 | my-argus |\n"));
        assert_eq!(lookup(&spawner).image_id("argus.*").unwrap(), None);
    }

    #[test]
    fn test_network_and_router_lookup() {
        let spawner = Arc::new(
            ScriptedSpawner::new()
                .on("network list", 0, "net-1 private\nnet-2 public\n")
                .on("router list", 0, "rt-1 router1\n")
                .on("subnet list", 0, "172.24.4.0/24\n"),
        );
        let cloud = lookup(&spawner);

        assert_eq!(cloud.network_id("public").unwrap().as_deref(), Some("net-2"));
        assert_eq!(cloud.router_id("router1").unwrap().as_deref(), Some("rt-1"));
        assert_eq!(cloud.router_id("router2").unwrap(), None);
        assert_eq!(cloud.network_cidr("public").unwrap().as_deref(), Some("172.24.4.0/24"));
        assert!(spawner
            .joined_calls()
            .iter()
            .any(|call| call.contains("subnet list --network net-2")));
    }

    #[test]
    fn test_failed_lookup_propagates() {
        let spawner = Arc::new(ScriptedSpawner::new().on("token issue", 1, ""));
        assert!(lookup(&spawner).tenant_id().is_err());
    }

    #[test]
    fn test_credentials_from_lookup() {
        let credentials = Credentials::from_lookup(|key| match key {
            "OS_USERNAME" => Some("admin".to_string()),
            "OS_AUTH_URL" => Some("http://keystone".to_string()),
            _ => None,
        });

        assert!(credentials.is_complete());
        assert_eq!(credentials.username.as_deref(), Some("admin"));
        assert_eq!(credentials.env_variables().len(), 2);
        assert!(!Credentials::default().is_complete());
    }
}
