//! Whole-host scan: enumerate instances, scan each, then plan ports.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{allocate, AllocationPlan, InstanceScanResult, ScanSummary};
use crate::ports::{InstanceEnumeratorPort, SocketListerPort};

use super::scanner::InstanceScanner;

/// Everything collected by one scan run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Scan results in enumeration order.
    pub instances: Vec<InstanceScanResult>,
    /// Why enumeration failed, if it did. The scan then has no instances.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enumeration_error: Option<String>,
    /// Whether the run was stopped before every instance was scanned.
    pub aborted: bool,
}

impl ScanReport {
    /// Allocate external ports for the scanned instances.
    pub fn plan(&self) -> AllocationPlan {
        allocate(&self.instances)
    }

    /// Aggregate counts for the final summary.
    pub fn summary(&self) -> ScanSummary {
        ScanSummary::from_results(&self.instances)
    }
}

/// Application service that drives a full scan.
pub struct ScanService<E: InstanceEnumeratorPort, L: SocketListerPort> {
    enumerator: E,
    scanner: InstanceScanner<L>,
}

impl<E: InstanceEnumeratorPort, L: SocketListerPort> ScanService<E, L> {
    /// Create a new scan service.
    pub fn new(enumerator: E, lister: L) -> Self {
        Self {
            enumerator,
            scanner: InstanceScanner::new(lister),
        }
    }

    /// List instances, degrading an enumeration failure to an empty list.
    pub async fn enumerate(&self) -> (Vec<String>, Option<String>) {
        match self.enumerator.list_instances().await {
            Ok(instances) => {
                info!(count = instances.len(), "Instances enumerated");
                (instances, None)
            }
            Err(e) => {
                warn!(error = %e, "Failed to enumerate instances");
                (Vec::new(), Some(format!("Failed to get WSL instances: {}", e)))
            }
        }
    }

    /// Enumerate and scan every instance in order.
    ///
    /// `abort` is checked before each instance; once set, the instances
    /// scanned so far are returned as if enumeration had stopped there.
    /// `on_instance` is called with each result as soon as it is ready.
    pub async fn run<F>(&self, abort: &AtomicBool, on_instance: F) -> ScanReport
    where
        F: FnMut(&InstanceScanResult),
    {
        let (instance_ids, enumeration_error) = self.enumerate().await;
        let mut report = self.scan_all(&instance_ids, abort, on_instance).await;
        report.enumeration_error = enumeration_error;
        report
    }

    /// Scan the given instances in order. See [`ScanService::run`].
    pub async fn scan_all<F>(
        &self,
        instance_ids: &[String],
        abort: &AtomicBool,
        mut on_instance: F,
    ) -> ScanReport
    where
        F: FnMut(&InstanceScanResult),
    {
        let mut report = ScanReport::default();

        for instance_id in instance_ids {
            if abort.load(Ordering::SeqCst) {
                warn!(
                    scanned = report.instances.len(),
                    remaining = instance_ids.len() - report.instances.len(),
                    "Scan aborted"
                );
                report.aborted = true;
                break;
            }

            let result = self.scanner.scan(instance_id).await;
            on_instance(&result);
            report.instances.push(result);
        }

        report
    }
}
