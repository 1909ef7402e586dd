//! Error types for each layer: the store backend, the wire-visible service
//! errors, and the client side of a call.

use serde::{Deserialize, Serialize};

/// Failures raised by a [`ProductStore`](crate::store::ProductStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned to RPC callers. Carries only text so it can cross the wire.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ShoppingError {
    #[error("product not found: {0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(String),
}

impl From<StoreError> for ShoppingError {
    fn from(err: StoreError) -> Self {
        ShoppingError::Store(err.to_string())
    }
}

/// Everything that can go wrong on the client side of one call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("rpc failed: {0}")]
    Rpc(#[from] tarpc::client::RpcError),
    #[error(transparent)]
    Service(#[from] ShoppingError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
