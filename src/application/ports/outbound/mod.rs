//! Outbound ports - Interfaces that the application requires from external systems

mod blob_transfer_port;
mod remote_content_port;
mod world_host_port;
mod world_registry_port;

pub use blob_transfer_port::{BlobTransferPort, ShareHints, SharedLink};
pub use remote_content_port::{RemoteContentPort, RemoteEntry, RemoteError};
pub use world_host_port::{HostError, WorldHostPort};
pub use world_registry_port::WorldRegistryPort;

#[cfg(test)]
pub use blob_transfer_port::MockBlobTransferPort;
#[cfg(test)]
pub use remote_content_port::MockRemoteContentPort;
