//! Port forwarder configuration: generation, persistence and validation.
//!
//! The generated file is consumed by the WSL2 port forwarder service, so the
//! JSON layout (field names, order, and the optional `internal_port`) must
//! stay stable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::{AllocationPlan, ExternalMapping};
use crate::error::{Error, Result};

/// Interval the forwarder waits between reconciliation passes.
pub const CHECK_INTERVAL_SECONDS: u64 = 5;

/// Firewall scope written for every generated port.
pub const FIREWALL_LOCAL: &str = "local";

/// Bounds the forwarder accepts for `check_interval_seconds`.
const CHECK_INTERVAL_RANGE: std::ops::RangeInclusive<u64> = 1..=3600;

/// Top-level forwarder configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwarderConfig {
    pub check_interval_seconds: u64,
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
}

/// Forwarded ports of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub ports: Vec<PortConfig>,
}

/// One forwarded port. `port` is the host side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    pub port: u16,

    /// Port inside the instance. Omitted when equal to `port`; `0` reads as unset.
    #[serde(
        default,
        deserialize_with = "zero_as_unset",
        skip_serializing_if = "Option::is_none"
    )]
    pub internal_port: Option<u16>,

    #[serde(default = "default_firewall")]
    pub firewall: String,

    #[serde(default)]
    pub comment: String,
}

fn default_firewall() -> String {
    FIREWALL_LOCAL.to_string()
}

fn zero_as_unset<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u16>::deserialize(deserializer)?.filter(|port| *port != 0))
}

impl PortConfig {
    /// Build the config entry for a planned mapping.
    pub fn from_mapping(mapping: &ExternalMapping) -> Self {
        if mapping.is_same_port() {
            Self {
                port: mapping.external_port,
                internal_port: None,
                firewall: default_firewall(),
                comment: format!("{} service (same port internally)", mapping.service_label),
            }
        } else {
            Self {
                port: mapping.external_port,
                internal_port: Some(mapping.internal_port),
                firewall: default_firewall(),
                comment: format!(
                    "{} service (external {} -> internal {})",
                    mapping.service_label, mapping.external_port, mapping.internal_port
                ),
            }
        }
    }

    /// The port the forwarder connects to inside the instance.
    pub fn effective_internal_port(&self) -> u16 {
        self.internal_port
            .filter(|port| *port != 0)
            .unwrap_or(self.port)
    }
}

/// An external port listed by more than one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedPort {
    pub port: u16,
    /// Instance names in file order; the first wins at runtime.
    pub instances: Vec<String>,
}

impl ForwarderConfig {
    /// Build the forwarder configuration from an allocation plan.
    pub fn from_plan(plan: &AllocationPlan) -> Self {
        let instances = plan
            .instances
            .iter()
            .map(|instance| {
                let ports: Vec<PortConfig> =
                    instance.mappings.iter().map(PortConfig::from_mapping).collect();
                InstanceConfig {
                    name: instance.instance_id.clone(),
                    comment: format!("Auto-discovered WSL2 instance with {} services", ports.len()),
                    ports,
                }
            })
            .collect();

        Self {
            check_interval_seconds: CHECK_INTERVAL_SECONDS,
            instances,
        }
    }

    /// Total number of forwarded ports.
    pub fn port_count(&self) -> usize {
        self.instances.iter().map(|i| i.ports.len()).sum()
    }

    /// Check the structural rules the forwarder enforces on load.
    pub fn validate(&self) -> Result<()> {
        if !CHECK_INTERVAL_RANGE.contains(&self.check_interval_seconds) {
            return Err(Error::Validation(
                "check_interval_seconds must be between 1 and 3600".to_string(),
            ));
        }

        for instance in &self.instances {
            if instance.name.is_empty() {
                return Err(Error::Validation("instance name cannot be empty".to_string()));
            }

            for port in &instance.ports {
                if port.port == 0 {
                    return Err(Error::Validation(format!(
                        "invalid external port number {} in instance {}",
                        port.port, instance.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// External ports claimed by more than one instance, ordered by port.
    ///
    /// These are allowed (instances may never run together) but only the
    /// first instance gets the port when they do.
    pub fn shared_external_ports(&self) -> Vec<SharedPort> {
        let mut owners: BTreeMap<u16, Vec<String>> = BTreeMap::new();
        for instance in &self.instances {
            for port in &instance.ports {
                owners.entry(port.port).or_default().push(instance.name.clone());
            }
        }

        owners
            .into_iter()
            .filter(|(_, instances)| instances.len() > 1)
            .map(|(port, instances)| SharedPort { port, instances })
            .collect()
    }
}

/// Reads and writes forwarder configuration files.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a store for the given file.
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Get the configuration file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load and parse the configuration without validating it.
    pub async fn load(&self) -> Result<ForwarderConfig> {
        let content = fs::read_to_string(&self.config_path).await.map_err(|e| {
            Error::Config(format!(
                "Failed to read config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    /// Save the configuration as pretty-printed JSON.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub async fn save(&self, config: &ForwarderConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(config)?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;

        fs::rename(&temp_path, &self.config_path).await?;

        Ok(())
    }
}
