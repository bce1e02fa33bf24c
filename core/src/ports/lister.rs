//! Socket lister port (interface).

use crate::error::Result;

/// Port for reading the listening sockets of one instance.
///
/// Implementations handle how the listing is obtained (`ss` over `wsl.exe`,
/// canned output in tests, etc.).
pub trait SocketListerPort: Send + Sync {
    /// Return the raw tabular socket report of an instance.
    ///
    /// Any failure, including a non-zero exit or a timeout, is an error.
    fn list_sockets(
        &self,
        instance_id: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}
