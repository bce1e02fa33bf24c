//! Domain layer - Pure scanning and allocation logic.
//!
//! This module contains the data model and the algorithms that turn raw
//! socket listings into a port forwarding plan. These types have no I/O
//! dependencies and can be tested in isolation.

mod allocation;
mod instance;
mod service;
mod socket;
mod summary;

// Re-export all domain types
pub use allocation::{
    allocate, AllocationPlan, Allocator, Claimant, Conflict, ExternalMapping, InstanceMappings,
    FALLBACK_BASE,
};
pub use instance::{InstanceScanResult, PortRecord, Protocol};
pub use service::{classify, labels, Rule, RULES};
pub use socket::{is_loopback, parse_listening_sockets, split_local_address};
pub use summary::ScanSummary;
