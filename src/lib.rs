//! Shopping list service: a tarpc RPC surface over a hash-per-product
//! key-value store, plus the pieces the console client shares with it.

pub mod config;
pub mod connections;
pub mod error;
pub mod logging;
pub mod script;
pub mod service;
pub mod shared_types;
pub mod store;

pub use error::{ClientError, ShoppingError, StoreError};
pub use service::ShoppingServer;
pub use shared_types::*;
pub use store::{MemoryStore, ProductStore, RedisStore};
