use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Order, PaymentMethod, PaymentStatus};

/// Shown in place of a step time that has not happened yet.
pub const PENDING_PLACEHOLDER: &str = "pending";

/// Processing and shipping flags: setting keeps the first timestamp, clearing always clears.
pub fn mark_step(
    current: Option<DateTime<Utc>>,
    done: bool,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if done { current.or(Some(now)) } else { None }
}

/// Payment toggle: `paid` stamps the current time, `pending` clears it.
pub fn mark_payment(paid: bool, now: DateTime<Utc>) -> (PaymentStatus, Option<DateTime<Utc>>) {
    if paid {
        (PaymentStatus::Paid, Some(now))
    } else {
        (PaymentStatus::Pending, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStage {
    Placed,
    AwaitingPayment,
    Processing,
    Shipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusStep {
    pub label: String,
    /// Formatted step time, or `"pending"`.
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DisplayStatus {
    pub stage: OrderStage,
    pub payment: StatusStep,
    pub processing: StatusStep,
    pub shipping: StatusStep,
}

/// Read-time status of an order. Never stored; every read path calls this.
///
/// The flags are independent, so a shipped order that was never marked as
/// processing still reports `Shipped`.
pub fn derive_status(order: &Order) -> DisplayStatus {
    let paid = order.payment_status == PaymentStatus::Paid;
    let awaiting_payment = order.payment_method == PaymentMethod::Card && !paid;

    let stage = if order.shipped_at.is_some() {
        OrderStage::Shipped
    } else if order.processed_at.is_some() {
        OrderStage::Processing
    } else if awaiting_payment {
        OrderStage::AwaitingPayment
    } else {
        OrderStage::Placed
    };

    let payment_label = if paid {
        "paid"
    } else if awaiting_payment {
        "awaiting payment"
    } else {
        "pay on delivery"
    };

    DisplayStatus {
        stage,
        payment: step(payment_label, order.paid_at),
        processing: step(
            if order.processed_at.is_some() { "processing" } else { "not started" },
            order.processed_at,
        ),
        shipping: step(
            if order.shipped_at.is_some() { "shipped" } else { "not shipped" },
            order.shipped_at,
        ),
    }
}

fn step(label: &str, at: Option<DateTime<Utc>>) -> StatusStep {
    StatusStep {
        label: label.to_string(),
        time: at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| PENDING_PLACEHOLDER.to_string()),
    }
}
