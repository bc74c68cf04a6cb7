use chrono::{DateTime, Utc};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, EntityTrait, QuerySelect, Set, TransactionTrait,
    prelude::DateTimeWithTimeZone,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        OrderError,
        lifecycle::{mark_payment, mark_step},
    },
    dto::orders::{
        PaymentFragment, ProcessingFragment, SetPaymentRequest, SetProcessedRequest,
        SetShippedRequest, ShippingFragment,
    },
    entity::orders::{ActiveModel as OrderActive, Entity as Orders, Model as OrderModel},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    notify::{self, EVENT_ORDER_UPDATED},
    response::{ApiResponse, Meta},
    services::order_service::load_detail,
    state::AppState,
};

pub async fn set_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SetPaymentRequest,
) -> AppResult<ApiResponse<PaymentFragment>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let existing = lock_order(&txn, id).await?;

    let (payment_status, paid_at) = mark_payment(payload.paid, Utc::now());
    let mut active: OrderActive = existing.into();
    active.payment_status = Set(payment_status.as_str().into());
    active.paid_at = Set(paid_at.map(Into::into));
    let order = active.update(&txn).await?;

    txn.commit().await?;

    let fragment = PaymentFragment {
        id: order.id,
        payment_status,
        paid_at: stored_time(order.paid_at),
    };
    tracing::info!(order_id = %order.id, paid = payload.paid, "order payment updated");
    after_transition(state, user, "order_payment", order, &fragment).await;

    Ok(ApiResponse::success(
        "Payment updated",
        fragment,
        Some(Meta::empty()),
    ))
}

pub async fn set_processed(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SetProcessedRequest,
) -> AppResult<ApiResponse<ProcessingFragment>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let existing = lock_order(&txn, id).await?;

    let current = stored_time(existing.processed_at);
    let processed_at = mark_step(current, payload.processed, Utc::now());
    let mut active: OrderActive = existing.into();
    active.processed_at = Set(processed_at.map(Into::into));
    let order = active.update(&txn).await?;

    txn.commit().await?;

    let fragment = ProcessingFragment {
        id: order.id,
        processed_at: stored_time(order.processed_at),
    };
    tracing::info!(order_id = %order.id, processed = payload.processed, "order processing updated");
    after_transition(state, user, "order_process", order, &fragment).await;

    Ok(ApiResponse::success(
        "Processing updated",
        fragment,
        Some(Meta::empty()),
    ))
}

pub async fn set_shipped(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SetShippedRequest,
) -> AppResult<ApiResponse<ShippingFragment>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let existing = lock_order(&txn, id).await?;

    let current = stored_time(existing.shipped_at);
    let shipped_at = mark_step(current, payload.shipped, Utc::now());
    let mut active: OrderActive = existing.into();
    active.shipped_at = Set(shipped_at.map(Into::into));
    let order = active.update(&txn).await?;

    txn.commit().await?;

    let fragment = ShippingFragment {
        id: order.id,
        shipped_at: stored_time(order.shipped_at),
    };
    tracing::info!(order_id = %order.id, shipped = payload.shipped, "order shipping updated");
    after_transition(state, user, "order_ship", order, &fragment).await;

    Ok(ApiResponse::success(
        "Shipping updated",
        fragment,
        Some(Meta::empty()),
    ))
}

/// The column as persisted, which is coarser than the clock it was stamped from.
fn stored_time(value: Option<DateTimeWithTimeZone>) -> Option<DateTime<Utc>> {
    value.map(|t| t.with_timezone(&Utc))
}

/// Row lock held until commit, so a repeated "mark" sees the first timestamp.
async fn lock_order(txn: &DatabaseTransaction, id: Uuid) -> AppResult<OrderModel> {
    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(OrderError::OrderNotFound)?;
    Ok(order)
}

/// Audit, then the fragment to admins, then the reloaded order to its owner.
/// Nothing here can fail the transition that already committed.
async fn after_transition<F: Serialize>(
    state: &AppState,
    user: &AuthUser,
    action: &str,
    order: OrderModel,
    fragment: &F,
) {
    audit::record(
        &state.pool,
        user.user_id,
        action,
        "orders",
        serde_json::json!({ "order_id": order.id, "change": fragment }),
    )
    .await;

    if let Some(payload) = notify::to_payload(fragment) {
        state.notifier.publish_to_admin(EVENT_ORDER_UPDATED, payload);
    }

    let owner = order.user_id;
    match load_detail(&state.pool, order).await {
        Ok(detail) => {
            if let Some(payload) = notify::to_payload(&detail) {
                state
                    .notifier
                    .publish_to_user(owner, EVENT_ORDER_UPDATED, payload);
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, user_id = %owner, "order reload for notification failed");
        }
    }
}
