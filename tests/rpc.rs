use std::collections::HashMap;

use async_trait::async_trait;
use shopping_list::config::ClientConfig;
use shopping_list::script::{self, Command, Request};
use shopping_list::*;
use tarpc::server::{self, Channel};
use tarpc::{client, context};

/// Serve `store` over an in-process channel and return a connected client.
fn start<S: ProductStore>(store: S) -> ShoppingServiceClient {
    let (client_transport, server_transport) = tarpc::transport::channel::unbounded();
    let server = server::BaseChannel::with_defaults(server_transport);
    tokio::spawn(server.execute(ShoppingServer::new(store).serve()));
    ShoppingServiceClient::new(client::Config::default(), client_transport).spawn()
}

fn product(name: &str, quantity: i32) -> ProductRequest {
    ProductRequest {
        name: name.to_string(),
        quantity,
    }
}

fn named(name: &str) -> ProductNameRequest {
    ProductNameRequest {
        name: name.to_string(),
    }
}

#[tokio::test]
async fn crud_round_trip_over_rpc() -> anyhow::Result<()> {
    let client = start(MemoryStore::new());

    let res = client.add_product(context::current(), product("Milk", 2)).await??;
    assert_eq!(res.message, "Product added");

    let milk = client.get_product(context::current(), named("Milk")).await??;
    assert_eq!(milk.quantity, 2);
    assert!(!milk.purchased);

    let res = client.update_product(context::current(), product("Milk", 3)).await??;
    assert_eq!(res.message, "Product updated");
    let res = client.mark_as_purchased(context::current(), named("Milk")).await??;
    assert_eq!(res.message, "Product marked as purchased");

    let milk = client.get_product(context::current(), named("Milk")).await??;
    assert_eq!(
        milk,
        Product {
            name: "Milk".to_string(),
            quantity: 3,
            purchased: true,
        }
    );

    let res = client.delete_product(context::current(), named("Milk")).await??;
    assert_eq!(res.message, "Product deleted");
    let missing = client.get_product(context::current(), named("Milk")).await?;
    assert_eq!(missing, Err(ShoppingError::NotFound("Milk".to_string())));
    Ok(())
}

#[tokio::test]
async fn list_returns_every_added_product() -> anyhow::Result<()> {
    let client = start(MemoryStore::new());
    for (i, name) in ["Flour", "Sugar", "Salt", "Yeast"].iter().enumerate() {
        client
            .add_product(context::current(), product(name, i as i32 + 1))
            .await??;
    }

    let list = client.list_products(context::current(), Void {}).await??;
    let mut by_name: HashMap<_, _> = list
        .products
        .into_iter()
        .map(|p| (p.name.clone(), p))
        .collect();
    assert_eq!(by_name.len(), 4);
    let salt = by_name.remove("Salt").unwrap();
    assert_eq!(salt.quantity, 3);
    assert!(!salt.purchased);
    Ok(())
}

#[tokio::test]
async fn empty_store_lists_nothing() -> anyhow::Result<()> {
    let client = start(MemoryStore::new());
    let list = client.list_products(context::current(), Void {}).await??;
    assert!(list.products.is_empty());
    Ok(())
}

#[tokio::test]
async fn shopping_scenario() -> anyhow::Result<()> {
    let client = start(MemoryStore::new());
    let ctx = context::current;

    client.add_product(ctx(), product("Apples", 10)).await??;
    client.add_product(ctx(), product("Bananas", 5)).await??;
    client.add_product(ctx(), product("Oranges", 7)).await??;
    assert_eq!(client.list_products(ctx(), Void {}).await??.products.len(), 3);

    client.update_product(ctx(), product("Apples", 15)).await??;
    assert_eq!(client.get_product(ctx(), named("Apples")).await??.quantity, 15);

    client.delete_product(ctx(), named("Bananas")).await??;
    assert_eq!(client.list_products(ctx(), Void {}).await??.products.len(), 2);

    client.mark_as_purchased(ctx(), named("Oranges")).await??;
    let oranges = client.get_product(ctx(), named("Oranges")).await??;
    assert!(oranges.purchased);
    assert_eq!(oranges.quantity, 7);
    Ok(())
}

#[tokio::test]
async fn demo_session_prints_each_step() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let client = start(store.clone());
    let config = ClientConfig::default();
    let mut out = Vec::new();

    script::execute(&client, &config, Command::Demo, &mut out).await?;
    let text = String::from_utf8(out)?;

    assert_eq!(text.matches("Product added: Product added").count(), 3);
    assert_eq!(text.matches("Shopping list:").count(), 3);
    assert!(text.contains("Update succeeded: Product updated"));
    assert!(text.contains("Delete succeeded: Product deleted"));
    assert!(text.contains("Marked as purchased: Product marked as purchased"));
    // the last listing reflects every mutation
    let last_list = text.rsplit("Shopping list:").next().unwrap_or_default();
    assert!(last_list.contains("Name: Apples, Quantity: 15, Purchased: false"));
    assert!(last_list.contains("Name: Oranges, Quantity: 7, Purchased: true"));
    assert!(!last_list.contains("Bananas"));

    let server = ShoppingServer::new(store);
    assert_eq!(server.list().await?.products.len(), 2);
    Ok(())
}

#[tokio::test]
async fn one_shot_get_of_unknown_product_fails() {
    let client = start(MemoryStore::new());
    let config = ClientConfig::default();
    let mut out = Vec::new();

    let err = script::send(
        &client,
        &config,
        Request::Get {
            name: "Unicorn".to_string(),
        },
        &mut out,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Service(ShoppingError::NotFound(ref name)) if name == "Unicorn"
    ));
    assert!(out.is_empty());
}

/// A backend whose every call fails, standing in for a lost connection.
struct DownStore;

#[async_trait]
impl ProductStore for DownStore {
    async fn set_fields(&self, _: &str, _: &[(&str, String)]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn get_fields(&self, _: &str) -> Result<HashMap<String, String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn delete(&self, _: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn keys_with_prefix(&self, _: &str) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn store_failures_pass_through_as_text() -> anyhow::Result<()> {
    let client = start(DownStore);
    let expected = ShoppingError::Store("store unavailable: connection refused".to_string());

    let add = client.add_product(context::current(), product("Tea", 1)).await?;
    assert_eq!(add, Err(expected.clone()));
    let list = client.list_products(context::current(), Void {}).await?;
    assert_eq!(list, Err(expected.clone()));
    let get = client.get_product(context::current(), named("Tea")).await?;
    assert_eq!(get, Err(expected));
    Ok(())
}

/// Fails only the per-product read, after enumeration succeeded.
struct FlakyReads(MemoryStore);

#[async_trait]
impl ProductStore for FlakyReads {
    async fn set_fields(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError> {
        self.0.set_fields(key, fields).await
    }

    async fn get_fields(&self, _: &str) -> Result<HashMap<String, String>, StoreError> {
        Err(StoreError::Unavailable("read timed out".to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.0.delete(key).await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.0.keys_with_prefix(prefix).await
    }
}

#[tokio::test]
async fn list_surfaces_per_item_read_failures() -> anyhow::Result<()> {
    let store = FlakyReads(MemoryStore::new());
    store
        .set_fields("product:Tea", &[("quantity", "1".to_string())])
        .await?;
    let client = start(store);

    let list = client.list_products(context::current(), Void {}).await?;
    assert_eq!(
        list,
        Err(ShoppingError::Store("store unavailable: read timed out".to_string()))
    );
    Ok(())
}
