//! Aggregate figures over a finished scan.

use std::collections::BTreeMap;

use serde::Serialize;

use super::instance::InstanceScanResult;

/// Counts reported at the end of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub total_instances: usize,
    pub accessible_instances: usize,
    pub listening_ports: usize,
    /// Number of ports per service label, sorted by label.
    pub service_counts: BTreeMap<String, usize>,
}

impl ScanSummary {
    pub fn from_results(results: &[InstanceScanResult]) -> Self {
        let mut summary = Self {
            total_instances: results.len(),
            ..Self::default()
        };

        for result in results.iter().filter(|r| r.accessible) {
            summary.accessible_instances += 1;
            summary.listening_ports += result.ports.len();
            for port in &result.ports {
                *summary
                    .service_counts
                    .entry(port.service_label.clone())
                    .or_default() += 1;
            }
        }

        summary
    }
}
