use std::io::Write;

use anyhow::Context as _;
use clap::Parser;
use shopping_list::config::{self, ClientConfig};
use shopping_list::logging::setup_tracing;
use shopping_list::script::{self, Command};
use shopping_list::*;
use tarpc::client;
use tarpc::tokio_serde::formats::Json;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "shopping-client", about = "Console client for the shopping list service")]
struct Args {
    /// Service address
    #[arg(long, env = "SHOPPING_SERVER", default_value = config::DEFAULT_SERVER_ADDR)]
    server: String,
    /// Deadline for each call, in seconds (1 to 5)
    #[arg(long, env = "SHOPPING_TIMEOUT_SECS", default_value_t = config::MIN_CALL_TIMEOUT_SECS)]
    timeout_secs: u64,
    /// Defaults to the scripted demo session
    #[command(subcommand)]
    command: Option<Command>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing();
    let args = Args::parse();
    let config = ClientConfig {
        server_addr: args.server,
        ..ClientConfig::default()
    }
    .with_timeout_secs(args.timeout_secs);

    info!(server = %config.server_addr, "connecting");
    let transport = tarpc::serde_transport::tcp::connect(&config.server_addr, Json::default)
        .await
        .with_context(|| format!("failed to connect to {}", config.server_addr))?;
    let client = ShoppingServiceClient::new(client::Config::default(), transport).spawn();

    let command = args.command.unwrap_or(Command::Demo);
    let mut out = std::io::stdout().lock();
    script::execute(&client, &config, command.clone(), &mut out)
        .await
        .with_context(|| format!("{command:?} failed"))?;
    out.flush()?;
    Ok(())
}
