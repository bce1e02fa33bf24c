//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with external systems. Implementations live in `adapters`.

mod enumerator;
mod lister;

pub use enumerator::InstanceEnumeratorPort;
pub use lister::SocketListerPort;
