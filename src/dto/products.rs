use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub weight: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[schema(value_type = Option<String>)]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub is_sale: bool,
    #[serde(default)]
    pub is_hit: bool,
    #[serde(default)]
    pub is_recommended: bool,
    #[serde(default)]
    pub quantity: i32,
    pub in_stock: Option<bool>,
}

/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub weight: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub sale_price: Option<Decimal>,
    /// Removes the sale price altogether.
    #[serde(default)]
    pub clear_sale_price: bool,
    pub is_sale: Option<bool>,
    pub is_hit: Option<bool>,
    pub is_recommended: Option<bool>,
    pub quantity: Option<i32>,
    pub in_stock: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
