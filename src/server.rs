use anyhow::Context as _;
use clap::Parser;
use futures::future;
use futures_util::StreamExt;
use shopping_list::config::{self, ServerConfig, StoreBackend};
use shopping_list::connections::ConnectionLimiter;
use shopping_list::logging::setup_tracing;
use shopping_list::*;
use tarpc::server::{self, Channel};
use tarpc::tokio_serde::formats::Json;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "shopping-server", about = "Shopping list RPC service")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "SHOPPING_LISTEN", default_value = config::DEFAULT_LISTEN_ADDR)]
    listen: String,
    /// Redis URL holding the product records
    #[arg(long, env = "SHOPPING_REDIS_URL", default_value = config::DEFAULT_REDIS_URL)]
    redis_url: String,
    /// Keep products in process memory instead of redis
    #[arg(long)]
    memory: bool,
    /// Maximum concurrent client connections
    #[arg(long, env = "SHOPPING_MAX_CONNECTIONS", default_value_t = config::DEFAULT_MAX_CONNECTIONS)]
    max_connections: usize,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        let backend = if args.memory {
            StoreBackend::Memory
        } else {
            StoreBackend::Redis {
                url: args.redis_url,
            }
        };
        ServerConfig {
            listen_addr: args.listen,
            backend,
            max_connections: args.max_connections,
        }
    }
}

async fn serve<S: ProductStore>(store: S, config: ServerConfig) -> anyhow::Result<()> {
    let server = ShoppingServer::new(store);
    let limiter = ConnectionLimiter::new(config.max_connections);

    // JSON framing over TCP, same as the client dials with.
    let mut listener = tarpc::serde_transport::tcp::listen(&config.listen_addr, Json::default)
        .await
        .with_context(|| format!("failed to listen on {}", config.listen_addr))?;
    listener.config_mut().max_frame_length(usize::MAX);

    info!(addr = %listener.local_addr(), max_connections = limiter.max_connections(), "server running");

    listener
        // Ignore accept errors.
        .filter_map(|r| future::ready(r.ok()))
        .map(server::BaseChannel::with_defaults)
        .for_each(|channel| {
            let server = server.clone();
            let limiter = limiter.clone();
            async move {
                let peer = channel
                    .transport()
                    .peer_addr()
                    .map(|addr| addr.to_string())
                    .unwrap_or_else(|_| "unknown".to_string());

                let Some(permit) = limiter.try_acquire() else {
                    warn!(%peer, max = limiter.max_connections(), "connection limit reached, rejecting");
                    return;
                };
                info!(%peer, active = limiter.active(), "client connected");

                let fut = channel.execute(server.serve());
                tokio::spawn(async move {
                    fut.await;
                    drop(permit);
                    info!(%peer, active = limiter.active(), "client disconnected");
                });
            }
        })
        .await;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing();
    let config = ServerConfig::from(Args::parse());

    match config.backend.clone() {
        StoreBackend::Redis { url } => {
            let store = RedisStore::connect(&url)
                .await
                .with_context(|| format!("failed to connect to redis at {url}"))?;
            info!(%url, "using redis store");
            serve(store, config).await
        }
        StoreBackend::Memory => {
            info!("using in-memory store");
            serve(MemoryStore::new(), config).await
        }
    }
}
