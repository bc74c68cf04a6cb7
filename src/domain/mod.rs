//! Order rules that do not touch the database.
//!
//! [`checkout`] turns a submitted cart into a priced, stock-checked quote and
//! [`lifecycle`] holds the admin transition rules and the read-time status labels.
//! The services wrap both in transactions.

pub mod checkout;
pub mod lifecycle;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Phone number is required")]
    MissingPhone,

    #[error("Product {0} not found")]
    ProductNotFound(Uuid),

    #[error("Insufficient stock for \"{product}\": only {available} available")]
    InsufficientStock { product: String, available: i32 },

    #[error("Order not found")]
    OrderNotFound,
}

impl OrderError {
    pub fn code(&self) -> &'static str {
        match self {
            OrderError::EmptyCart => "EMPTY_CART",
            OrderError::InvalidQuantity => "INVALID_QUANTITY",
            OrderError::MissingPhone => "MISSING_PHONE",
            OrderError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            OrderError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            OrderError::OrderNotFound => "ORDER_NOT_FOUND",
        }
    }
}
