//! HTTP surface: route table and per-resource handlers.

use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod cart_handlers;
pub mod coupon_handlers;
pub mod order_handlers;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy", "service": "dozan-commerce"})) }),
        )
        .route(
            "/api/v1/cart",
            get(cart_handlers::get_cart).delete(cart_handlers::clear_cart),
        )
        .route("/api/v1/cart/items", post(cart_handlers::add_to_cart))
        .route("/api/v1/cart/count", get(cart_handlers::get_cart_count))
        .route(
            "/api/v1/cart/items/:line_id",
            put(cart_handlers::update_item_quantity).delete(cart_handlers::delete_item),
        )
        .route(
            "/api/v1/cart/coupon",
            post(coupon_handlers::apply_coupon).delete(coupon_handlers::remove_coupon),
        )
        .route("/api/v1/checkout", post(order_handlers::checkout))
        .route("/api/v1/orders", get(order_handlers::list_orders))
        .route(
            "/api/v1/orders/:id",
            get(order_handlers::get_order).delete(order_handlers::delete_order),
        )
        .route("/api/v1/orders/:id/status", put(order_handlers::update_order_status))
        .route(
            "/api/v1/coupons",
            get(coupon_handlers::list_coupons).post(coupon_handlers::create_coupon),
        )
        .route(
            "/api/v1/coupons/:id",
            put(coupon_handlers::update_coupon).delete(coupon_handlers::delete_coupon),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
