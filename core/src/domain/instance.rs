//! Per-instance scan results.

use serde::{Deserialize, Serialize};

/// Transport protocol of a listening socket. Only TCP is scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
        }
    }
}

/// A non-loopback TCP listening socket found inside an instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRecord {
    /// The port number the service listens on inside the instance.
    pub port: u16,
    /// Always TCP.
    pub protocol: Protocol,
    /// Bind address exactly as reported by `ss` (e.g. "0.0.0.0", "[::]", "*").
    pub bound_address: String,
    /// Label assigned by the service classifier.
    pub service_label: String,
    /// Process name from the `users:` column, if `ss` could see it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
}

impl PortRecord {
    /// Create a new TCP port record.
    pub fn tcp(
        port: u16,
        bound_address: impl Into<String>,
        service_label: impl Into<String>,
        process: Option<String>,
    ) -> Self {
        Self {
            port,
            protocol: Protocol::Tcp,
            bound_address: bound_address.into(),
            service_label: service_label.into(),
            process,
        }
    }
}

impl std::fmt::Display for PortRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}/{} ({})",
            self.bound_address, self.port, self.protocol, self.service_label
        )
    }
}

/// Outcome of scanning one instance.
///
/// An inaccessible instance carries an error detail and never any ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceScanResult {
    pub instance_id: String,
    pub accessible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(default)]
    pub ports: Vec<PortRecord>,
}

impl InstanceScanResult {
    /// A successfully scanned instance.
    pub fn accessible(instance_id: impl Into<String>, ports: Vec<PortRecord>) -> Self {
        Self {
            instance_id: instance_id.into(),
            accessible: true,
            error_detail: None,
            ports,
        }
    }

    /// An instance whose socket listing could not be obtained.
    pub fn inaccessible(instance_id: impl Into<String>, error_detail: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            accessible: false,
            error_detail: Some(error_detail.into()),
            ports: Vec::new(),
        }
    }

    /// Ports ordered by port number, for display.
    pub fn ports_by_number(&self) -> Vec<&PortRecord> {
        let mut ports: Vec<&PortRecord> = self.ports.iter().collect();
        ports.sort_by_key(|p| p.port);
        ports
    }
}
