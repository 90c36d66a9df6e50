use thiserror::Error;

use super::credentials::{ProductType, ResourceId};
use super::transport::SessionError;

/// # Errors produced by resources, the pool and the durable store.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ResourceError {
    /// No session driver exists for the product.
    #[error("no session driver for product {product}")]
    InvalidTesterType { product: ProductType },

    /// Credentials failed validation.
    #[error("invalid credentials: {reason}")]
    InvalidCredentials { reason: String },

    /// The session handshake or initial sync failed.
    #[error("communication with tester {host}:{port} failed: {source}")]
    TesterCommunication {
        id: ResourceId,
        host: String,
        port: u16,
        #[source]
        source: SessionError,
    },

    /// `connect()` on an online resource.
    #[error("tester {id} is already connected")]
    IsConnected { id: ResourceId },

    /// `disconnect()` on an offline resource.
    #[error("tester {id} is already disconnected")]
    IsDisconnected { id: ResourceId },

    /// Lookup of an id the pool does not hold.
    #[error("unknown tester {id}")]
    UnknownResource { id: ResourceId },

    /// Durable store failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ResourceError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ResourceError::InvalidTesterType { .. } => "resource_invalid_tester_type",
            ResourceError::InvalidCredentials { .. } => "resource_invalid_credentials",
            ResourceError::TesterCommunication { .. } => "resource_tester_communication",
            ResourceError::IsConnected { .. } => "resource_is_connected",
            ResourceError::IsDisconnected { .. } => "resource_is_disconnected",
            ResourceError::UnknownResource { .. } => "resource_unknown",
            ResourceError::Storage(_) => "resource_storage",
        }
    }
}

/// # Errors produced by the durable tester store.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store content is malformed: {0}")]
    Codec(#[from] serde_json::Error),

    /// The blocking worker running the operation died.
    #[error("store worker failed: {0}")]
    Worker(String),
}
