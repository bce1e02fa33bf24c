//! Instance enumerator port (interface).

use crate::error::Result;

/// Port for discovering the instances to scan.
///
/// Implementations return instance identifiers in a stable order; that order
/// decides which instance wins a contested external port.
pub trait InstanceEnumeratorPort: Send + Sync {
    /// List instance identifiers, without header or decoration lines.
    fn list_instances(&self) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}
