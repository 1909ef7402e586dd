//! Client-side request flows: one-shot commands and the scripted batch
//! session. Output goes to any writer so the flows can be checked in tests.

use std::io::Write;

use clap::Subcommand;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::shared_types::*;

/// One RPC call.
#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
pub enum Request {
    /// Add a product, or overwrite one with the same name
    Add {
        name: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i32,
    },
    /// Show one product
    Get { name: String },
    /// Change a product's quantity
    Update {
        name: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i32,
    },
    /// Remove a product
    Delete { name: String },
    /// Show the whole shopping list
    List,
    /// Mark a product as purchased
    Purchase { name: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    #[command(flatten)]
    Request(Request),
    /// Run the scripted demo session
    Demo,
}

fn product_request(name: &str, quantity: i32) -> ProductRequest {
    ProductRequest {
        name: name.to_string(),
        quantity,
    }
}

fn name_request(name: &str) -> ProductNameRequest {
    ProductNameRequest {
        name: name.to_string(),
    }
}

/// Run `command`, writing results to `out`.
pub async fn execute<W: Write>(
    client: &ShoppingServiceClient,
    config: &ClientConfig,
    command: Command,
    out: &mut W,
) -> Result<(), ClientError> {
    match command {
        Command::Request(request) => send(client, config, request, out).await,
        Command::Demo => run_demo(client, config, out).await,
    }
}

/// Issue a single request and print its result.
pub async fn send<W: Write>(
    client: &ShoppingServiceClient,
    config: &ClientConfig,
    request: Request,
    out: &mut W,
) -> Result<(), ClientError> {
    match request {
        Request::Add { name, quantity } => {
            let res = client
                .add_product(config.call_context(), product_request(&name, quantity))
                .await??;
            writeln!(out, "Product added: {}", res.message)?;
        }
        Request::Get { name } => {
            let product = client
                .get_product(config.call_context(), name_request(&name))
                .await??;
            writeln!(out, "{product}")?;
        }
        Request::Update { name, quantity } => {
            let res = client
                .update_product(config.call_context(), product_request(&name, quantity))
                .await??;
            writeln!(out, "Update succeeded: {}", res.message)?;
        }
        Request::Delete { name } => {
            let res = client
                .delete_product(config.call_context(), name_request(&name))
                .await??;
            writeln!(out, "Delete succeeded: {}", res.message)?;
        }
        Request::List => {
            let list = client.list_products(config.call_context(), Void {}).await??;
            writeln!(out, "Shopping list:")?;
            for product in &list.products {
                writeln!(out, "{product}")?;
            }
        }
        Request::Purchase { name } => {
            let res = client
                .mark_as_purchased(config.call_context(), name_request(&name))
                .await??;
            writeln!(out, "Marked as purchased: {}", res.message)?;
        }
    }
    Ok(())
}

/// The fixed batch session: add three products, then update, delete and
/// purchase one each, listing in between. Stops at the first error.
pub async fn run_demo<W: Write>(
    client: &ShoppingServiceClient,
    config: &ClientConfig,
    out: &mut W,
) -> Result<(), ClientError> {
    let steps = [
        Request::Add {
            name: "Apples".into(),
            quantity: 10,
        },
        Request::Add {
            name: "Bananas".into(),
            quantity: 5,
        },
        Request::Add {
            name: "Oranges".into(),
            quantity: 7,
        },
        Request::List,
        Request::Update {
            name: "Apples".into(),
            quantity: 15,
        },
        Request::Delete {
            name: "Bananas".into(),
        },
        Request::List,
        Request::Purchase {
            name: "Oranges".into(),
        },
        Request::List,
    ];

    for step in steps {
        tracing::debug!(?step, "demo step");
        send(client, config, step, out).await?;
    }
    Ok(())
}
