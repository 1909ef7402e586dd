//! Hash-per-key storage behind the shopping service.
//!
//! Each product lives in one record whose sub-fields can be written
//! independently, so a quantity update never touches the purchased flag and
//! the other way round.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::debug;

use crate::error::StoreError;

/// The operations the service needs from a key-value backend.
#[async_trait]
pub trait ProductStore: Send + Sync + 'static {
    /// Set the given sub-fields of `key`, creating the record if absent.
    async fn set_fields(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError>;
    /// Read every sub-field of `key`. An absent key yields an empty map.
    async fn get_fields(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;
    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
    /// Every key starting with `prefix`, in backend order.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Redis hashes: HSET / HGETALL / DEL / KEYS.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Connect to the redis instance at `url`, e.g. `redis://127.0.0.1:6379/0`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        debug!(url, "connected to redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl ProductStore for RedisStore {
    async fn set_fields(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError> {
        // The multiplexed connection is cheap to clone and commands need `&mut`.
        let mut conn = self.conn.clone();
        let _: () = conn.hset_multiple(key, fields).await?;
        Ok(())
    }

    async fn get_fields(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(key).await?;
        Ok(fields)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(format!("{prefix}*")).await?;
        Ok(keys)
    }
}

/// In-process store with the same hash semantics as [`RedisStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, HashMap<String, String>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, HashMap<String, String>>>, StoreError>
    {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn set_fields(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError> {
        let mut records = self.records()?;
        let record = records.entry(key.to_string()).or_default();
        for (field, value) in fields {
            record.insert(field.to_string(), value.clone());
        }
        Ok(())
    }

    async fn get_fields(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let records = self.records()?;
        Ok(records.get(key).cloned().unwrap_or_default())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.records()?.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let records = self.records()?;
        Ok(records
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}
