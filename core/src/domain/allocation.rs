//! External port allocation across all scanned instances.
//!
//! Well-known services draw from per-service counters so every instance gets
//! a predictable host port (SSH on 2201, 2202, ...). Everything else is folded
//! into the 9000 range by `9000 + port % 1000`. Instances earlier in the scan
//! order get first claim on contended ports.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::instance::InstanceScanResult;
use super::service::labels;

/// Base of the fallback range for services without a dedicated counter.
pub const FALLBACK_BASE: u16 = 9000;

/// A planned host port for one service inside one instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalMapping {
    pub external_port: u16,
    pub internal_port: u16,
    pub instance_id: String,
    pub service_label: String,
}

impl ExternalMapping {
    /// Whether the host and instance ports are the same.
    pub fn is_same_port(&self) -> bool {
        self.external_port == self.internal_port
    }
}

/// A mapping that lost an external port to an earlier claimant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claimant {
    pub instance_id: String,
    pub internal_port: u16,
    pub service_label: String,
}

/// An external port wanted by more than one mapping.
///
/// The first mapping in scan order keeps the port and is not listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub external_port: u16,
    pub claimants: Vec<Claimant>,
}

/// All mappings of a single accessible instance, in scan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceMappings {
    pub instance_id: String,
    pub mappings: Vec<ExternalMapping>,
}

/// Result of an allocation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPlan {
    /// Accessible instances in enumeration order.
    pub instances: Vec<InstanceMappings>,
    /// Contended external ports in the order they were first contested.
    pub conflicts: Vec<Conflict>,
}

impl AllocationPlan {
    /// Total number of mappings across all instances.
    pub fn mapping_count(&self) -> usize {
        self.instances.iter().map(|i| i.mappings.len()).sum()
    }

    /// Iterate over every mapping in plan order.
    pub fn mappings(&self) -> impl Iterator<Item = &ExternalMapping> {
        self.instances.iter().flat_map(|i| i.mappings.iter())
    }

    /// Look up the conflict entry for an external port.
    pub fn conflict_for(&self, external_port: u16) -> Option<&Conflict> {
        self.conflicts
            .iter()
            .find(|c| c.external_port == external_port)
    }
}

/// Running counters and claimed ports for one allocation pass.
#[derive(Debug, Clone)]
pub struct Allocator {
    ssh: u16,
    http: u16,
    https: u16,
    mysql: u16,
    postgres: u16,
    redis: u16,
    dev: u16,
    used: HashSet<u16>,
    conflicts: Vec<Conflict>,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Take the current counter value and advance it.
fn take(counter: &mut u16) -> u16 {
    let port = *counter;
    *counter = counter.saturating_add(1);
    port
}

impl Allocator {
    /// Create an allocator with all counters at their base values.
    pub fn new() -> Self {
        Self {
            ssh: 2201,
            http: 8081,
            https: 8443,
            mysql: 3307,
            postgres: 5433,
            redis: 6380,
            dev: 9001,
            used: HashSet::new(),
            conflicts: Vec::new(),
        }
    }

    /// Pick the candidate external port for a service.
    ///
    /// Only the fallback branch steps around ports that are already taken;
    /// counter-based candidates are returned as-is.
    fn candidate(&mut self, internal_port: u16, label: &str) -> u16 {
        use labels::*;

        if label == SSH || internal_port == 22 {
            take(&mut self.ssh)
        } else if (label == HTTP || label == HTTP_ALT) && internal_port == 80 {
            take(&mut self.http)
        } else if label == HTTPS && internal_port == 443 {
            take(&mut self.https)
        } else if label == MYSQL && internal_port == 3306 {
            take(&mut self.mysql)
        } else if label == POSTGRESQL && internal_port == 5432 {
            take(&mut self.postgres)
        } else if label == REDIS && internal_port == 6379 {
            take(&mut self.redis)
        } else if [DEV_SERVER, NODE_DEV, FLASK_DEV].contains(&label) {
            take(&mut self.dev)
        } else {
            let mut port = FALLBACK_BASE + internal_port % 1000;
            // Stops at the top of the range; a taken 65535 becomes a conflict
            while self.used.contains(&port) {
                match port.checked_add(1) {
                    Some(next) => port = next,
                    None => break,
                }
            }
            port
        }
    }

    /// Assign an external port to one service, recording a conflict if the
    /// candidate is already claimed.
    pub fn assign(&mut self, instance_id: &str, internal_port: u16, label: &str) -> ExternalMapping {
        let external_port = self.candidate(internal_port, label);

        if self.used.contains(&external_port) {
            let claimant = Claimant {
                instance_id: instance_id.to_string(),
                internal_port,
                service_label: label.to_string(),
            };
            match self
                .conflicts
                .iter_mut()
                .find(|c| c.external_port == external_port)
            {
                Some(conflict) => conflict.claimants.push(claimant),
                None => self.conflicts.push(Conflict {
                    external_port,
                    claimants: vec![claimant],
                }),
            }
        } else {
            self.used.insert(external_port);
        }

        ExternalMapping {
            external_port,
            internal_port,
            instance_id: instance_id.to_string(),
            service_label: label.to_string(),
        }
    }

    /// Consume the allocator, returning the recorded conflicts.
    pub fn into_conflicts(self) -> Vec<Conflict> {
        self.conflicts
    }
}

/// Allocate external ports for every port of every accessible instance.
///
/// Inaccessible instances contribute neither mappings nor conflicts.
pub fn allocate(results: &[InstanceScanResult]) -> AllocationPlan {
    let mut allocator = Allocator::new();
    let mut instances = Vec::new();

    for result in results.iter().filter(|r| r.accessible) {
        let mappings = result
            .ports
            .iter()
            .map(|p| allocator.assign(&result.instance_id, p.port, &p.service_label))
            .collect();

        instances.push(InstanceMappings {
            instance_id: result.instance_id.clone(),
            mappings,
        });
    }

    AllocationPlan {
        instances,
        conflicts: allocator.into_conflicts(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instance::PortRecord;

    fn instance(id: &str, ports: &[(u16, &str)]) -> InstanceScanResult {
        InstanceScanResult::accessible(
            id,
            ports
                .iter()
                .map(|(port, label)| PortRecord::tcp(*port, "0.0.0.0", *label, None))
                .collect(),
        )
    }

    fn external_ports(plan: &AllocationPlan) -> Vec<u16> {
        plan.mappings().map(|m| m.external_port).collect()
    }

    #[test]
    fn test_ssh_counter_follows_instance_order() {
        let results = vec![
            instance("Ubuntu", &[(22, "SSH")]),
            instance("Debian", &[(22, "SSH")]),
            instance("Alpine", &[(22, "SSH")]),
        ];

        let plan = allocate(&results);
        assert_eq!(external_ports(&plan), vec![2201, 2202, 2203]);
        let owners: Vec<&str> = plan.mappings().map(|m| m.instance_id.as_str()).collect();
        assert_eq!(owners, vec!["Ubuntu", "Debian", "Alpine"]);
        assert!(plan.conflicts.is_empty());
    }

    #[test]
    fn test_service_counters() {
        let results = vec![instance(
            "Ubuntu",
            &[
                (80, "HTTP"),
                (443, "HTTPS"),
                (3306, "MySQL"),
                (5432, "PostgreSQL"),
                (6379, "Redis"),
                (3000, "Node.js Dev"),
                (5000, "Flask Dev"),
                (3500, "Dev Server"),
            ],
        )];

        let plan = allocate(&results);
        assert_eq!(
            external_ports(&plan),
            vec![8081, 8443, 3307, 5433, 6380, 9001, 9002, 9003]
        );
    }

    #[test]
    fn test_ssh_by_port_or_label() {
        // Port 22 goes to the SSH counter whatever its label, and so does an
        // sshd found on another port.
        let results = vec![instance("Ubuntu", &[(22, "Unknown"), (2222, "SSH")])];
        let plan = allocate(&results);
        assert_eq!(external_ports(&plan), vec![2201, 2202]);
    }

    #[test]
    fn test_counters_need_matching_port() {
        // An HTTP server off port 80 is not counter-allocated
        let results = vec![instance("Ubuntu", &[(81, "HTTP"), (8080, "HTTP Alt")])];
        let plan = allocate(&results);
        assert_eq!(external_ports(&plan), vec![9081, 9080]);
    }

    #[test]
    fn test_fallback_steps_over_used_ports() {
        let results = vec![
            instance("Ubuntu", &[(1234, "Unknown")]),
            instance("Debian", &[(2234, "Unknown"), (4234, "Python")]),
        ];

        let plan = allocate(&results);
        assert_eq!(external_ports(&plan), vec![9234, 9235, 9236]);
        assert!(plan.conflicts.is_empty());
    }

    #[test]
    fn test_counter_collides_with_fallback() {
        // 7001 folds to 9001, which the dev counter hands out next
        let results = vec![
            instance("Ubuntu", &[(7001, "Unknown")]),
            instance("Debian", &[(3500, "Dev Server")]),
        ];

        let plan = allocate(&results);
        assert_eq!(plan.instances.len(), 2);
        assert_eq!(external_ports(&plan), vec![9001, 9001]);

        assert_eq!(plan.conflicts.len(), 1);
        let conflict = plan.conflict_for(9001).unwrap();
        assert_eq!(
            conflict.claimants,
            vec![Claimant {
                instance_id: "Debian".to_string(),
                internal_port: 3500,
                service_label: "Dev Server".to_string(),
            }]
        );
    }

    #[test]
    fn test_counter_and_fallback_interleave() {
        let results = vec![
            instance("Ubuntu", &[(7001, "Unknown")]),
            instance("Debian", &[(3500, "Dev Server"), (3001, "React Dev")]),
            instance("Alpine", &[(3600, "Dev Server")]),
        ];

        let plan = allocate(&results);
        // React Dev has no counter: 9001 is taken so it steps to 9002, which
        // the dev counter then hands to Alpine.
        assert_eq!(external_ports(&plan), vec![9001, 9001, 9002, 9002]);
        assert_eq!(plan.conflicts.len(), 2);
        assert_eq!(plan.conflicts[0].external_port, 9001);
        assert_eq!(plan.conflicts[1].external_port, 9002);
        assert_eq!(plan.conflicts[1].claimants[0].instance_id, "Alpine");
    }

    #[test]
    fn test_each_contested_port_gets_its_own_entry() {
        let results = vec![
            instance("A", &[(7001, "Unknown"), (7002, "Unknown")]),
            instance("B", &[(3500, "Dev Server")]),
            instance("C", &[(3501, "Dev Server")]),
        ];

        let plan = allocate(&results);
        assert_eq!(external_ports(&plan), vec![9001, 9002, 9001, 9002]);
        assert_eq!(plan.conflicts.len(), 2);
        assert_eq!(plan.conflicts[0].claimants.len(), 1);
        assert_eq!(plan.conflicts[1].claimants.len(), 1);
    }

    #[test]
    fn test_inaccessible_instances_are_skipped() {
        let results = vec![
            InstanceScanResult::inaccessible("Broken", "exit 1: "),
            instance("Ubuntu", &[(22, "SSH")]),
        ];

        let plan = allocate(&results);
        assert_eq!(plan.instances.len(), 1);
        assert_eq!(plan.instances[0].instance_id, "Ubuntu");
        assert_eq!(external_ports(&plan), vec![2201]);
        assert!(plan.conflicts.is_empty());
    }

    #[test]
    fn test_accessible_instance_without_ports_is_kept() {
        let results = vec![instance("Empty", &[])];
        let plan = allocate(&results);
        assert_eq!(plan.instances.len(), 1);
        assert!(plan.instances[0].mappings.is_empty());
        assert_eq!(plan.mapping_count(), 0);
    }

    #[test]
    fn test_allocation_is_deterministic() {
        let results = vec![
            instance("Ubuntu", &[(22, "SSH"), (8888, "Python"), (7001, "Unknown")]),
            instance("Debian", &[(80, "HTTP"), (3500, "Dev Server"), (8888, "Python")]),
        ];

        let first = serde_json::to_vec(&allocate(&results)).unwrap();
        let second = serde_json::to_vec(&allocate(&results)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fallback_stops_at_top_of_range() {
        let mut allocator = Allocator::new();
        allocator.used.extend(9080..=u16::MAX);

        let mapping = allocator.assign("Ubuntu", 12080, labels::UNKNOWN);
        assert_eq!(mapping.external_port, u16::MAX);

        let conflicts = allocator.into_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].external_port, u16::MAX);
        assert_eq!(conflicts[0].claimants[0].internal_port, 12080);
    }
}
