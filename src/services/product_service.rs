use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products},
    error::{AppError, AppResult, unique_violation_or},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }
    if let Some(is_sale) = query.is_sale {
        condition = condition.add(Column::IsSale.eq(is_sale));
    }
    if let Some(is_hit) = query.is_hit {
        condition = condition.add(Column::IsHit.eq(is_hit));
    }
    if let Some(is_recommended) = query.is_recommended {
        condition = condition.add(Column::IsRecommended.eq(is_recommended));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Product::from)
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    validate_pricing(Some(payload.price), payload.sale_price, Some(payload.quantity))?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        weight: Set(payload.weight),
        price: Set(payload.price),
        sale_price: Set(payload.sale_price),
        is_sale: Set(payload.is_sale),
        is_hit: Set(payload.is_hit),
        is_recommended: Set(payload.is_recommended),
        quantity: Set(payload.quantity),
        in_stock: Set(payload.in_stock.unwrap_or(payload.quantity > 0)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| unique_violation_or(err, name_taken))?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

/// Catalog edits only; placed orders keep the prices they were bought at.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    validate_pricing(payload.price, payload.sale_price, payload.quantity)?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name.filter(|n| !n.trim().is_empty()) {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(weight) = payload.weight {
        active.weight = Set(Some(weight));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if payload.clear_sale_price {
        active.sale_price = Set(None);
    } else if let Some(sale_price) = payload.sale_price {
        active.sale_price = Set(Some(sale_price));
    }
    if let Some(is_sale) = payload.is_sale {
        active.is_sale = Set(is_sale);
    }
    if let Some(is_hit) = payload.is_hit {
        active.is_hit = Set(is_hit);
    }
    if let Some(is_recommended) = payload.is_recommended {
        active.is_recommended = Set(is_recommended);
    }
    if let Some(quantity) = payload.quantity {
        active.quantity = Set(quantity);
    }
    if let Some(in_stock) = payload.in_stock {
        active.in_stock = Set(in_stock);
    }

    let product = active
        .update(&state.orm)
        .await
        .map_err(|err| unique_violation_or(err, name_taken))?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

fn name_taken() -> AppError {
    AppError::BadRequest("Product name is already taken".into())
}

fn validate_pricing(
    price: Option<Decimal>,
    sale_price: Option<Decimal>,
    quantity: Option<i32>,
) -> AppResult<()> {
    if price.is_some_and(|p| p <= Decimal::ZERO) {
        return Err(AppError::BadRequest("price must be positive".into()));
    }
    if sale_price.is_some_and(|p| p <= Decimal::ZERO) {
        return Err(AppError::BadRequest("sale_price must be positive".into()));
    }
    if quantity.is_some_and(|q| q < 0) {
        return Err(AppError::BadRequest("quantity must not be negative".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_rules() {
        assert!(validate_pricing(Some(Decimal::from(10)), Some(Decimal::from(8)), Some(0)).is_ok());
        assert!(validate_pricing(Some(Decimal::ZERO), None, None).is_err());
        assert!(validate_pricing(None, Some(Decimal::from(-1)), None).is_err());
        assert!(validate_pricing(None, None, Some(-3)).is_err());
        assert!(validate_pricing(None, None, None).is_ok());
    }
}
