//! Per-instance socket scanning service.

use tracing::{info, warn};

use crate::domain::{parse_listening_sockets, InstanceScanResult};
use crate::ports::SocketListerPort;

/// Scans one instance at a time through a [`SocketListerPort`].
///
/// A failed listing is recorded on the result instead of being returned as
/// an error, so callers can carry on with the next instance.
pub struct InstanceScanner<L: SocketListerPort> {
    lister: L,
}

impl<L: SocketListerPort> InstanceScanner<L> {
    /// Create a new scanner with the given lister.
    pub fn new(lister: L) -> Self {
        Self { lister }
    }

    /// Scan a single instance for non-loopback TCP listeners.
    pub async fn scan(&self, instance_id: &str) -> InstanceScanResult {
        match self.lister.list_sockets(instance_id).await {
            Ok(output) => {
                let ports = parse_listening_sockets(&output);
                info!(instance = instance_id, ports = ports.len(), "Instance scanned");
                InstanceScanResult::accessible(instance_id, ports)
            }
            Err(e) => {
                warn!(instance = instance_id, error = %e, "Instance inaccessible");
                InstanceScanResult::inaccessible(instance_id, format!("Failed to access: {}", e))
            }
        }
    }
}
