//! Order endpoints: checkout plus lifecycle management.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::Principal;
use crate::domain::aggregates::order::{Order, OrderStatus, PaymentDetails};
use crate::error::{ApiError, ApiResult};
use crate::store::{carts, orders};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub user_id: Option<Uuid>,
    pub payment_details: PaymentDetails,
    #[validate(length(min = 1, message = "payment method is required"))]
    pub payment_method: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub message: &'static str,
    pub order: Order,
}

/// The one-shot cart-to-order transition. The order snapshot, the order
/// number allocation and the cart deletion commit together or not at
/// all.
pub async fn checkout(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<CheckoutResponse>)> {
    req.validate()?;
    let target = principal.resolve_target(req.user_id)?;
    let cart = carts::find_by_user(&state.db, target)
        .await?
        .ok_or(ApiError::CartNotFound)?;
    if cart.is_empty() {
        return Err(ApiError::CartNotFound);
    }
    let order = orders::checkout(&state.db, &cart, req.payment_details, req.payment_method).await?;
    tracing::info!(
        user_id = %target,
        order_number = %order.order_number,
        total = %order.total,
        "order created"
    );
    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse { message: "Order created successfully", order }),
    ))
}

pub async fn get_order(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    let order = orders::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::OrderNotFound)?;
    if !principal.can_act_for(order.user_id) {
        return Err(ApiError::Unauthorized);
    }
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// "all" (default) or one of the status names.
    pub filter: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub total_orders: i64,
    pub orders: Vec<orders::OrderSummary>,
    pub current_page: u32,
    pub total_pages: u32,
}

pub async fn list_orders(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<OrderListParams>,
) -> ApiResult<Json<OrderListResponse>> {
    principal.require_admin()?;
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(6).clamp(1, 100);
    let status = match params.filter.as_deref() {
        None | Some("all") => None,
        Some(value) => Some(
            OrderStatus::parse(value)
                .ok_or_else(|| ApiError::Validation(format!("unknown status '{value}'")))?,
        ),
    };
    let (orders, total) =
        orders::list(&state.db, page, limit, status, params.search.as_deref()).await?;
    let total_pages = (total as u32).div_ceil(limit).max(1);
    Ok(Json(OrderListResponse { total_orders: total, orders, current_page: page, total_pages }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Admin-only. Any enumerated status is accepted from any state; there
/// is deliberately no transition table.
pub async fn update_order_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Order>> {
    principal.require_admin()?;
    let status = OrderStatus::parse(&req.status)
        .ok_or_else(|| ApiError::Validation(format!("unknown status '{}'", req.status)))?;
    let order = orders::update_status(&state.db, id, status)
        .await?
        .ok_or(ApiError::OrderNotFound)?;
    tracing::info!(order_number = %order.order_number, status = %status, "order status updated");
    Ok(Json(order))
}

pub async fn delete_order(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    principal.require_admin()?;
    if !orders::delete(&state.db, id).await? {
        return Err(ApiError::OrderNotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
