use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    orders::Model as OrderModel, products::Model as ProductModel, users::Model as UserModel,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub weight: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[schema(value_type = Option<String>)]
    pub sale_price: Option<Decimal>,
    /// Price actually charged: the sale price while the product is on sale.
    #[schema(value_type = String)]
    pub effective_price: Decimal,
    pub is_sale: bool,
    pub is_hit: bool,
    pub is_recommended: bool,
    pub quantity: i32,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ProductModel> for Product {
    fn from(model: ProductModel) -> Self {
        let effective_price = effective_price(model.price, model.sale_price, model.is_sale);
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            weight: model.weight,
            price: model.price,
            sale_price: model.sale_price,
            effective_price,
            is_sale: model.is_sale,
            is_hit: model.is_hit,
            is_recommended: model.is_recommended,
            quantity: model.quantity,
            in_stock: model.in_stock,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// The sale price when the product is on sale and has one, the base price otherwise.
pub fn effective_price(price: Decimal, sale_price: Option<Decimal>, is_sale: bool) -> Decimal {
    match sale_price {
        Some(sale) if is_sale => sale,
        _ => price,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    OnDelivery,
    Card,
}

impl PaymentMethod {
    /// Anything other than exactly `"card"` falls back to payment on delivery.
    pub fn from_request(raw: Option<&str>) -> Self {
        match raw {
            Some("card") => PaymentMethod::Card,
            _ => PaymentMethod::OnDelivery,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::OnDelivery => "on_delivery",
            PaymentMethod::Card => "card",
        }
    }

    pub fn from_db(raw: &str) -> Self {
        Self::from_request(Some(raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn from_db(raw: &str) -> Self {
        match raw {
            "paid" => PaymentStatus::Paid,
            _ => PaymentStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub card_last4: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<OrderModel> for Order {
    fn from(model: OrderModel) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            total: model.total,
            address: model.address,
            phone: model.phone,
            payment_method: PaymentMethod::from_db(&model.payment_method),
            payment_status: PaymentStatus::from_db(&model.payment_status),
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            processed_at: model.processed_at.map(|dt| dt.with_timezone(&Utc)),
            shipped_at: model.shipped_at.map(|dt| dt.with_timezone(&Utc)),
            card_last4: model.card_last4,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    /// Current catalog name; the row itself only stores the product reference.
    pub product_name: Option<String>,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_price_applies_only_while_on_sale() {
        let price = Decimal::from(100);
        let sale = Some(Decimal::from(80));
        assert_eq!(effective_price(price, sale, true), Decimal::from(80));
        assert_eq!(effective_price(price, sale, false), Decimal::from(100));
        assert_eq!(effective_price(price, None, true), Decimal::from(100));
    }

    #[test]
    fn unknown_payment_method_degrades_to_delivery() {
        assert_eq!(PaymentMethod::from_request(Some("card")), PaymentMethod::Card);
        assert_eq!(PaymentMethod::from_request(Some("Card")), PaymentMethod::OnDelivery);
        assert_eq!(PaymentMethod::from_request(Some("crypto")), PaymentMethod::OnDelivery);
        assert_eq!(PaymentMethod::from_request(None), PaymentMethod::OnDelivery);
    }
}
