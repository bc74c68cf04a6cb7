mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use storefront_orders::{build_app, services::auth_service::issue_token};
use tower::ServiceExt;
use uuid::Uuid;

use common::{TEST_SECRET, offline_state};

fn token_for(role: &str) -> String {
    issue_token(Uuid::new_v4(), role, TEST_SECRET, 1).expect("token")
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let app = build_app(offline_state());
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

#[tokio::test]
async fn orders_require_a_token() {
    let request = Request::builder()
        .uri("/api/orders")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn forged_tokens_are_rejected() {
    let forged = issue_token(Uuid::new_v4(), "admin", "some-other-secret", 1).unwrap();
    let request = Request::builder()
        .uri("/api/orders")
        .header(header::AUTHORIZATION, format!("Bearer {forged}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn customers_cannot_ship_orders() {
    let token = token_for("user");
    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/api/admin/orders/{}/ship", Uuid::new_v4()))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "shipped": true }).to_string()))
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["data"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn empty_cart_is_rejected_before_any_lookup() {
    let token = token_for("user");
    let request = post_json(
        "/api/orders",
        Some(&token),
        json!({ "items": [], "phone": "+1 555 0101" }),
    );
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "EMPTY_CART");
}

#[tokio::test]
async fn blank_phone_is_rejected() {
    let token = token_for("user");
    let request = post_json(
        "/api/orders",
        Some(&token),
        json!({
            "items": [{ "product_id": Uuid::new_v4(), "quantity": 1 }],
            "phone": "   ",
        }),
    );
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "MISSING_PHONE");
}

#[tokio::test]
async fn zero_quantity_is_rejected() {
    let token = token_for("user");
    let request = post_json(
        "/api/orders",
        Some(&token),
        json!({
            "items": [{ "product_id": Uuid::new_v4(), "quantity": 0 }],
            "phone": "+1 555 0101",
        }),
    );
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "INVALID_QUANTITY");
}

#[tokio::test]
async fn live_updates_require_a_token() {
    let request = Request::builder()
        .uri("/api/ws")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(request).await;
    assert_ne!(status, StatusCode::SWITCHING_PROTOCOLS);
    assert!(status.is_client_error());
}

#[tokio::test]
async fn health_and_fallback() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    let request = Request::builder()
        .uri("/api/nowhere")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/api/nowhere");
}

#[tokio::test]
async fn malformed_cart_lines_get_the_error_envelope() {
    let token = token_for("user");
    let request = post_json(
        "/api/orders",
        Some(&token),
        json!({
            "items": [{ "product_id": Uuid::new_v4(), "quantity": "x" }],
            "phone": "+1 555 0101",
        }),
    );
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "BAD_REQUEST");
    assert!(body["message"].is_string());

    let request = post_json(
        "/api/orders",
        Some(&token),
        json!({ "items": [{ "quantity": 1 }], "phone": "+1 555 0101" }),
    );
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn non_json_bodies_get_the_error_envelope() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn malformed_ids_and_queries_get_the_error_envelope() {
    let token = token_for("user");
    let request = Request::builder()
        .uri("/api/orders/not-a-uuid")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "BAD_REQUEST");

    let request = Request::builder()
        .uri("/api/products?page=first")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "BAD_REQUEST");
}
