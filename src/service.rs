//! The RPC-facing shopping service. Every operation is one or two store
//! calls; the server itself holds no locks and no state beyond the store
//! handle it was built with.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tarpc::context;
use tracing::{debug, instrument};

use crate::error::ShoppingError;
use crate::shared_types::*;
use crate::store::ProductStore;

/// Every product record lives under this key prefix.
pub const KEY_PREFIX: &str = "product:";

const QUANTITY_FIELD: &str = "quantity";
const PURCHASED_FIELD: &str = "purchased";

pub fn product_key(name: &str) -> String {
    format!("{KEY_PREFIX}{name}")
}

/// Decode a stored flag. Unrecognised text reads as `false`.
fn parse_flag(value: &str) -> bool {
    matches!(value, "1" | "t" | "T" | "TRUE" | "true" | "True")
}

/// Build a product from its stored fields; malformed values read as 0 / false.
fn decode_product(name: String, fields: &HashMap<String, String>) -> Product {
    let quantity = fields
        .get(QUANTITY_FIELD)
        .and_then(|value| value.parse::<i32>().ok())
        .unwrap_or(0);
    let purchased = fields
        .get(PURCHASED_FIELD)
        .map(|value| parse_flag(value))
        .unwrap_or(false);
    Product {
        name,
        quantity,
        purchased,
    }
}

fn reply(message: &str) -> ProductResponse {
    ProductResponse {
        message: message.to_string(),
    }
}

pub struct ShoppingServer<S> {
    store: Arc<S>,
}

// tarpc consumes the server per request, so clones must share the store.
impl<S> Clone for ShoppingServer<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ProductStore> ShoppingServer<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    #[instrument(skip_all, fields(name = %req.name, quantity = req.quantity), err)]
    pub async fn add(&self, req: ProductRequest) -> Result<ProductResponse, ShoppingError> {
        let fields = [
            (QUANTITY_FIELD, req.quantity.to_string()),
            (PURCHASED_FIELD, false.to_string()),
        ];
        self.store.set_fields(&product_key(&req.name), &fields).await?;
        Ok(reply("Product added"))
    }

    #[instrument(skip_all, fields(name = %req.name), err)]
    pub async fn get(&self, req: ProductNameRequest) -> Result<Product, ShoppingError> {
        let fields = self.store.get_fields(&product_key(&req.name)).await?;
        if fields.is_empty() {
            return Err(ShoppingError::NotFound(req.name));
        }
        Ok(decode_product(req.name, &fields))
    }

    #[instrument(skip_all, fields(name = %req.name, quantity = req.quantity), err)]
    pub async fn update(&self, req: ProductRequest) -> Result<ProductResponse, ShoppingError> {
        let fields = [(QUANTITY_FIELD, req.quantity.to_string())];
        self.store.set_fields(&product_key(&req.name), &fields).await?;
        Ok(reply("Product updated"))
    }

    #[instrument(skip_all, fields(name = %req.name), err)]
    pub async fn delete(&self, req: ProductNameRequest) -> Result<ProductResponse, ShoppingError> {
        self.store.delete(&product_key(&req.name)).await?;
        Ok(reply("Product deleted"))
    }

    #[instrument(skip_all, err)]
    pub async fn list(&self) -> Result<ProductList, ShoppingError> {
        let keys = self.store.keys_with_prefix(KEY_PREFIX).await?;
        let mut products = Vec::with_capacity(keys.len());
        for key in keys {
            let fields = self.store.get_fields(&key).await?;
            if fields.is_empty() {
                // deleted between enumeration and read
                debug!(%key, "skipping vanished product");
                continue;
            }
            let name = key.strip_prefix(KEY_PREFIX).unwrap_or(&key).to_string();
            products.push(decode_product(name, &fields));
        }
        Ok(ProductList { products })
    }

    #[instrument(skip_all, fields(name = %req.name), err)]
    pub async fn mark_purchased(
        &self,
        req: ProductNameRequest,
    ) -> Result<ProductResponse, ShoppingError> {
        let fields = [(PURCHASED_FIELD, true.to_string())];
        self.store.set_fields(&product_key(&req.name), &fields).await?;
        Ok(reply("Product marked as purchased"))
    }
}

impl<S: ProductStore> ShoppingService for ShoppingServer<S> {
    // Store calls are async, so each method hands tarpc a boxed future
    type AddProductFut = BoxFuture<'static, Result<ProductResponse, ShoppingError>>;
    type GetProductFut = BoxFuture<'static, Result<Product, ShoppingError>>;
    type UpdateProductFut = BoxFuture<'static, Result<ProductResponse, ShoppingError>>;
    type DeleteProductFut = BoxFuture<'static, Result<ProductResponse, ShoppingError>>;
    type ListProductsFut = BoxFuture<'static, Result<ProductList, ShoppingError>>;
    type MarkAsPurchasedFut = BoxFuture<'static, Result<ProductResponse, ShoppingError>>;

    fn add_product(self, _: context::Context, req: ProductRequest) -> Self::AddProductFut {
        async move { self.add(req).await }.boxed()
    }

    fn get_product(self, _: context::Context, req: ProductNameRequest) -> Self::GetProductFut {
        async move { self.get(req).await }.boxed()
    }

    fn update_product(self, _: context::Context, req: ProductRequest) -> Self::UpdateProductFut {
        async move { self.update(req).await }.boxed()
    }

    fn delete_product(
        self,
        _: context::Context,
        req: ProductNameRequest,
    ) -> Self::DeleteProductFut {
        async move { self.delete(req).await }.boxed()
    }

    fn list_products(self, _: context::Context, _: Void) -> Self::ListProductsFut {
        async move { self.list().await }.boxed()
    }

    fn mark_as_purchased(
        self,
        _: context::Context,
        req: ProductNameRequest,
    ) -> Self::MarkAsPurchasedFut {
        async move { self.mark_purchased(req).await }.boxed()
    }
}
