//! `key = value` configuration templating

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::types::ArestorResult;

/// Tempest configuration template shipped with the tool
pub const TEMPEST_TEMPLATE: &str = include_str!("../resources/tempest.conf");

/// Replace the value of every `key = value` line whose key is in `values`.
///
/// Lines without `=`, and comment lines, are copied unchanged. Assignment
/// lines are normalised to `key = value`.
pub fn render(template: &str, values: &BTreeMap<String, String>) -> String {
    let mut rendered = String::with_capacity(template.len());
    for line in template.lines() {
        let trimmed = line.trim_start();
        let is_comment = trimmed.starts_with('#') || trimmed.starts_with(';');

        match line.split_once('=') {
            Some((key, value)) if !is_comment => {
                let key = key.trim();
                let value = values.get(key).map(String::as_str).unwrap_or(value.trim());
                rendered.push_str(&format!("{} = {}", key, value));
            }
            _ => rendered.push_str(line),
        }
        rendered.push('\n');
    }
    rendered
}

/// Render `template` into `destination`, creating its parent directory
pub fn write_config(
    template: &str,
    values: &BTreeMap<String, String>,
    destination: &Path,
) -> ArestorResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(destination, render(template, values))?;
    Ok(())
}
