use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::lifecycle::DisplayStatus,
    models::{Order, OrderItem, PaymentStatus},
};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Checkout body. Prices are never taken from the client.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// `card` or `on_delivery`; anything else is treated as `on_delivery`.
    pub payment_method: Option<String>,
    pub card_last4: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub status: DisplayStatus,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminOrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub user_email: Option<String>,
    pub username: Option<String>,
    pub status: DisplayStatus,
}

/// `GET /orders` answers admins and customers with different shapes.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum OrderList {
    Admin(Vec<AdminOrderSummary>),
    Customer(Vec<OrderDetail>),
}

impl OrderList {
    pub fn len(&self) -> usize {
        match self {
            OrderList::Admin(items) => items.len(),
            OrderList::Customer(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SetPaymentRequest {
    pub paid: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SetProcessedRequest {
    pub processed: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SetShippedRequest {
    pub shipped: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentFragment {
    pub id: Uuid,
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProcessingFragment {
    pub id: Uuid,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShippingFragment {
    pub id: Uuid,
    pub shipped_at: Option<DateTime<Utc>>,
}
