use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    domain::{
        OrderError,
        checkout::{self, Quote, StockSnapshot, ValidatedOrder},
        lifecycle::derive_status,
    },
    dto::orders::{AdminOrderSummary, OrderDetail, OrderList, PlaceOrderRequest},
    entity::{
        order_items::{ActiveModel as OrderItemActive, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, PaymentStatus},
    notify::{self, EVENT_NEW_ORDER},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const ADMIN_LIST_LIMIT: u64 = 100;
pub const CUSTOMER_LIST_LIMIT: u64 = 50;

pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let request = checkout::validate(payload)?;

    let txn = state.orm.begin().await?;
    let order = match reserve_and_insert(&txn, user.user_id, &request).await {
        Ok(order) => order,
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "order rollback failed");
            }
            if let AppError::Order(reason) = &err {
                tracing::info!(user_id = %user.user_id, reason = %reason, "order rejected");
            }
            return Err(err);
        }
    };
    txn.commit().await?;

    let order = Order::from(order);
    tracing::info!(
        order_id = %order.id,
        user_id = %order.user_id,
        total = %order.total,
        payment_method = order.payment_method.as_str(),
        "order placed"
    );

    audit::record(
        &state.pool,
        user.user_id,
        "order_placed",
        "orders",
        serde_json::json!({ "order_id": order.id, "total": order.total }),
    )
    .await;

    if let Some(payload) = notify::to_payload(&order) {
        state.notifier.publish_to_admin(EVENT_NEW_ORDER, payload);
    }

    Ok(ApiResponse::success(
        "Order created",
        order,
        Some(Meta::empty()),
    ))
}

/// Every read and write of a placement. The caller owns commit and rollback.
async fn reserve_and_insert(
    txn: &DatabaseTransaction,
    user_id: Uuid,
    request: &ValidatedOrder,
) -> AppResult<OrderModel> {
    // Rows are locked in id order so checkouts sharing products cannot deadlock.
    let stock: HashMap<Uuid, StockSnapshot> = Products::find()
        .filter(ProdCol::Id.is_in(request.product_ids()))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(txn)
        .await?
        .into_iter()
        .map(|product| (product.id, StockSnapshot::from(product)))
        .collect();

    let quote = checkout::quote(request, &stock)?;

    let payment_status = request.payment_status();
    let paid_at = match payment_status {
        PaymentStatus::Paid => Some(Utc::now().into()),
        PaymentStatus::Pending => None,
    };

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        total: Set(quote.total),
        address: Set(request.address.clone()),
        phone: Set(Some(request.phone.clone())),
        payment_method: Set(request.payment_method.as_str().into()),
        payment_status: Set(payment_status.as_str().into()),
        paid_at: Set(paid_at),
        processed_at: Set(None),
        shipped_at: Set(None),
        card_last4: Set(request.card_last4.clone()),
        created_at: NotSet,
    }
    .insert(txn)
    .await?;

    insert_items(txn, order.id, &quote).await?;
    take_stock(txn, &quote, &stock).await?;

    Ok(order)
}

async fn insert_items(txn: &DatabaseTransaction, order_id: Uuid, quote: &Quote) -> AppResult<()> {
    let rows = quote
        .lines
        .iter()
        .enumerate()
        .map(|(position, line)| OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            product_id: Set(line.product_id),
            position: Set(position as i32),
            quantity: Set(line.quantity),
            price: Set(line.unit_price),
            created_at: NotSet,
        });
    OrderItems::insert_many(rows).exec(txn).await?;
    Ok(())
}

/// Conditional decrement on top of the row lock: a row that no longer covers the
/// reservation aborts the order instead of going negative.
async fn take_stock(
    txn: &DatabaseTransaction,
    quote: &Quote,
    stock: &HashMap<Uuid, StockSnapshot>,
) -> AppResult<()> {
    for (product_id, quantity) in &quote.reservations {
        let result = Products::update_many()
            .col_expr(ProdCol::Quantity, Expr::col(ProdCol::Quantity).sub(*quantity))
            .filter(ProdCol::Id.eq(*product_id))
            .filter(ProdCol::Quantity.gte(*quantity))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            let product = &stock[product_id];
            return Err(OrderError::InsufficientStock {
                product: product.name.clone(),
                available: product.quantity,
            }
            .into());
        }
    }
    Ok(())
}

pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let (list, limit) = if user.is_admin() {
        (OrderList::Admin(list_all(state).await?), ADMIN_LIST_LIMIT)
    } else {
        (
            OrderList::Customer(list_own(state, user.user_id).await?),
            CUSTOMER_LIST_LIMIT,
        )
    };

    let meta = Meta::capped(limit, list.len());
    Ok(ApiResponse::success("Ok", list, Some(meta)))
}

async fn list_all(state: &AppState) -> AppResult<Vec<AdminOrderSummary>> {
    let rows = Orders::find()
        .find_also_related(Users)
        .order_by_desc(OrderCol::CreatedAt)
        .limit(ADMIN_LIST_LIMIT)
        .all(&state.orm)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(order, owner)| {
            let order = Order::from(order);
            AdminOrderSummary {
                status: derive_status(&order),
                order,
                user_email: owner.as_ref().map(|u| u.email.clone()),
                username: owner.map(|u| u.username),
            }
        })
        .collect())
}

async fn list_own(state: &AppState, user_id: Uuid) -> AppResult<Vec<OrderDetail>> {
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .limit(CUSTOMER_LIST_LIMIT)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in load_items(&state.pool, &ids).await? {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|model| {
            let items = items_by_order.remove(&model.id).unwrap_or_default();
            detail(Order::from(model), items)
        })
        .collect())
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let mut condition = Condition::all().add(OrderCol::Id.eq(id));
    if !user.is_admin() {
        // Someone else's order looks exactly like a missing one.
        condition = condition.add(OrderCol::UserId.eq(user.user_id));
    }

    let order = Orders::find()
        .filter(condition)
        .one(&state.orm)
        .await?
        .ok_or(OrderError::OrderNotFound)?;

    let data = load_detail(&state.pool, order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

/// Items joined with the current product name, in submission order.
pub async fn load_items(pool: &DbPool, order_ids: &[Uuid]) -> AppResult<Vec<OrderItem>> {
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }

    let items = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name,
               oi.quantity, oi.price, oi.created_at
        FROM order_items oi
        LEFT JOIN products p ON p.id = oi.product_id
        WHERE oi.order_id = ANY($1)
        ORDER BY oi.order_id, oi.position
        "#,
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

pub async fn load_detail(pool: &DbPool, model: OrderModel) -> AppResult<OrderDetail> {
    let items = load_items(pool, &[model.id]).await?;
    Ok(detail(Order::from(model), items))
}

fn detail(order: Order, items: Vec<OrderItem>) -> OrderDetail {
    OrderDetail {
        status: derive_status(&order),
        order,
        items,
    }
}
