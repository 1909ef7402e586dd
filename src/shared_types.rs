use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ShoppingError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub quantity: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductNameRequest {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub quantity: i32,
    pub purchased: bool,
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {}, Quantity: {}, Purchased: {}",
            self.name, self.quantity, self.purchased
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductResponse {
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductList {
    pub products: Vec<Product>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Void {}

#[tarpc::service]
pub trait ShoppingService {
    /// Create or overwrite a product; purchased is reset to false
    async fn add_product(req: ProductRequest) -> Result<ProductResponse, ShoppingError>;
    /// Get a product by name
    async fn get_product(req: ProductNameRequest) -> Result<Product, ShoppingError>;
    /// Change the quantity, leaving purchased untouched
    async fn update_product(req: ProductRequest) -> Result<ProductResponse, ShoppingError>;
    /// Delete a product
    async fn delete_product(req: ProductNameRequest) -> Result<ProductResponse, ShoppingError>;
    /// List every stored product
    async fn list_products(req: Void) -> Result<ProductList, ShoppingError>;
    /// Set purchased, leaving quantity untouched
    async fn mark_as_purchased(req: ProductNameRequest) -> Result<ProductResponse, ShoppingError>;
}
