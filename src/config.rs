//! Defaults and runtime settings for both binaries. The binaries fill these
//! in from command-line flags and environment variables.

use std::time::{Duration, SystemTime};

use tarpc::context;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9090";
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:9090";
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;

/// Per-call deadline bounds, in seconds.
pub const MIN_CALL_TIMEOUT_SECS: u64 = 1;
pub const MAX_CALL_TIMEOUT_SECS: u64 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Redis { url: String },
    Memory,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub backend: StoreBackend,
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            backend: StoreBackend::Redis {
                url: DEFAULT_REDIS_URL.to_string(),
            },
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub server_addr: String,
    pub call_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            call_timeout: Duration::from_secs(MIN_CALL_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Set the per-call timeout, clamped to the supported range.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        let secs = secs.clamp(MIN_CALL_TIMEOUT_SECS, MAX_CALL_TIMEOUT_SECS);
        self.call_timeout = Duration::from_secs(secs);
        self
    }

    /// A fresh context whose deadline is one call timeout from now.
    pub fn call_context(&self) -> context::Context {
        let mut ctx = context::current();
        ctx.deadline = SystemTime::now() + self.call_timeout;
        ctx
    }
}
