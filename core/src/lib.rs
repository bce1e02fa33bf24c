//! wslports Core Library
//!
//! Discovers TCP listening services inside WSL instances and plans the host
//! ports they should be forwarded on.
//! Provides functionality to:
//! - Enumerate WSL distributions
//! - Scan each distribution's listening sockets (`ss -tlnp` as root)
//! - Classify services by port number, process name and port range
//! - Allocate conflict-aware external ports across all distributions
//! - Write and validate the port forwarder configuration
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure scanning and allocation logic
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod error;
pub mod settings;

// Re-export domain types (primary API)
pub use domain::{
    allocate, classify, AllocationPlan, Claimant, Conflict, ExternalMapping, InstanceMappings,
    InstanceScanResult, PortRecord, Protocol, ScanSummary,
};

// Re-export other commonly used types
pub use adapters::{WslEnumerator, WslSocketLister};
pub use application::{InstanceScanner, ScanReport, ScanService};
pub use config::{ConfigStore, ForwarderConfig, InstanceConfig, PortConfig, SharedPort};
pub use error::{Error, Result};
pub use settings::Settings;
