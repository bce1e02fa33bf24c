//! Instance enumeration via `wsl --list --verbose`.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::Result;
use crate::ports::InstanceEnumeratorPort;
use crate::settings::Settings;

use super::{decode_output, run_command};

/// Marker `wsl --list --verbose` puts in front of the default distribution.
const DEFAULT_MARKER: &str = "*";

/// Lists WSL distributions.
pub struct WslEnumerator {
    wsl_command: String,
    timeout: Duration,
}

impl WslEnumerator {
    pub fn new(settings: &Settings) -> Self {
        Self {
            wsl_command: settings.wsl_command.clone(),
            timeout: settings.command_timeout(),
        }
    }
}

impl InstanceEnumeratorPort for WslEnumerator {
    async fn list_instances(&self) -> Result<Vec<String>> {
        let args = ["--list".to_string(), "--verbose".to_string()];
        let stdout = run_command(&self.wsl_command, &args, self.timeout).await?;
        Ok(parse_instance_list(&decode_output(&stdout)))
    }
}

/// Parse `wsl --list --verbose` output into distribution names.
///
/// Expected format:
/// ```text
///   NAME            STATE           VERSION
/// * Ubuntu          Running         2
///   docker-desktop  Stopped         2
/// ```
///
/// The default marker is stripped and duplicate names are dropped.
pub fn parse_instance_list(output: &str) -> Vec<String> {
    let mut instances = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    // Header line
    for line in output.trim().lines().skip(1) {
        let line = line.trim_matches(|c: char| c.is_whitespace() || c == '\0');
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }

        let name = if parts[0] == DEFAULT_MARKER {
            parts[1]
        } else {
            parts[0]
        };

        if name.is_empty() || name == "NAME" {
            continue;
        }

        if seen.insert(name.to_string()) {
            instances.push(name.to_string());
        }
    }

    instances
}
