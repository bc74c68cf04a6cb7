use axum::{
    Json, Router,
    extract::State,
    routing::patch,
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        PaymentFragment, ProcessingFragment, SetPaymentRequest, SetProcessedRequest,
        SetShippedRequest, ShippingFragment,
    },
    error::AppResult,
    middleware::{
        auth::AuthUser,
        extract::{JsonBody, PathParam},
    },
    response::ApiResponse,
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders/{id}/payment", patch(set_payment))
        .route("/orders/{id}/process", patch(set_processed))
        .route("/orders/{id}/ship", patch(set_shipped))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/payment",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = SetPaymentRequest,
    responses(
        (status = 200, description = "Payment status toggled", body = ApiResponse<PaymentFragment>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_payment(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<SetPaymentRequest>,
) -> AppResult<Json<ApiResponse<PaymentFragment>>> {
    let resp = admin_service::set_payment(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/process",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = SetProcessedRequest,
    responses(
        (status = 200, description = "Processing mark toggled; an existing mark keeps its time", body = ApiResponse<ProcessingFragment>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_processed(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<SetProcessedRequest>,
) -> AppResult<Json<ApiResponse<ProcessingFragment>>> {
    let resp = admin_service::set_processed(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/ship",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = SetShippedRequest,
    responses(
        (status = 200, description = "Shipping mark toggled; an existing mark keeps its time", body = ApiResponse<ShippingFragment>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_shipped(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<SetShippedRequest>,
) -> AppResult<Json<ApiResponse<ShippingFragment>>> {
    let resp = admin_service::set_shipped(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
