//! Cart endpoints.
//!
//! Every mutation loads the owner's cart, applies the aggregate
//! operation (which recomputes all derived totals), and writes it back
//! with a version-checked update.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::Principal;
use crate::domain::aggregates::cart::{Cart, CartLine, NewLine};
use crate::domain::value_objects::{AppliedCoupon, CustomInput, VariantSelection};
use crate::error::{ApiError, ApiResult};
use crate::store::carts;
use crate::AppState;

const DEFAULT_PAGE_SIZE: u32 = 8;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartRequest {
    /// Admins may target another user's cart; everyone else targets
    /// their own.
    pub user_id: Option<Uuid>,
    pub product_id: Uuid,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub props: Option<VariantSelection>,
    #[serde(default)]
    pub inputs: Vec<CustomInput>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct TargetParams {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CartPageParams {
    pub user_id: Option<Uuid>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub user_id: Option<Uuid>,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct CartTotals {
    pub sub_total: Decimal,
    pub tax_price: Decimal,
    pub discount_percent: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub cart_id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartLine>,
    pub details: CartTotals,
    pub applied_coupon: Option<AppliedCoupon>,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            cart_id: cart.id(),
            user_id: cart.user_id(),
            items: cart.items().to_vec(),
            details: CartTotals {
                sub_total: cart.sub_total(),
                tax_price: cart.tax_price(),
                discount_percent: cart.discount_percent(),
                total: cart.total(),
            },
            applied_coupon: cart.applied_coupon().cloned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartSummaryResponse {
    pub cart_id: Uuid,
    pub total_items: usize,
    pub current_page: u32,
    pub total_pages: u32,
    pub items_per_page: u32,
    pub items: Vec<CartLine>,
    pub details: CartTotals,
    pub applied_coupon: Option<AppliedCoupon>,
}

async fn load_cart(state: &AppState, principal: Principal, requested: Option<Uuid>) -> ApiResult<Cart> {
    let target = principal.resolve_target(requested)?;
    carts::find_by_user(&state.db, target)
        .await?
        .ok_or(ApiError::CartNotFound)
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<AddToCartRequest>,
) -> ApiResult<Json<CartResponse>> {
    req.validate()?;
    if req.price <= Decimal::ZERO {
        return Err(ApiError::Validation("price must be positive".into()));
    }
    let target = principal.resolve_target(req.user_id)?;

    // Lazily create the cart on the first add.
    let existing = carts::find_by_user(&state.db, target).await?;
    let existed = existing.is_some();
    let mut cart = existing.unwrap_or_else(|| Cart::for_user(target));

    cart.add_item(NewLine {
        product_id: req.product_id,
        title: req.title,
        unit_price: req.price,
        image: req.image,
        variant: req.props,
        inputs: req.inputs,
        quantity: req.quantity,
    })?;
    carts::save(&state.db, &cart, existed).await?;
    tracing::info!(user_id = %target, lines = cart.line_count(), "item added to cart");
    Ok(Json(CartResponse::from(&cart)))
}

pub async fn get_cart(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<CartPageParams>,
) -> ApiResult<Json<CartSummaryResponse>> {
    let cart = load_cart(&state, principal, params.user_id).await?;
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let total_items = cart.line_count();
    let total_pages = (total_items as u32).div_ceil(limit).max(1);
    let start = usize::try_from(crate::store::page_offset(page, limit)).unwrap_or(usize::MAX);
    let items = cart
        .items()
        .iter()
        .skip(start)
        .take(limit as usize)
        .cloned()
        .collect();

    Ok(Json(CartSummaryResponse {
        cart_id: cart.id(),
        total_items,
        current_page: page,
        total_pages,
        items_per_page: limit,
        items,
        details: CartTotals {
            sub_total: cart.sub_total(),
            tax_price: cart.tax_price(),
            discount_percent: cart.discount_percent(),
            total: cart.total(),
        },
        applied_coupon: cart.applied_coupon().cloned(),
    }))
}

pub async fn get_cart_count(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<TargetParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let cart = load_cart(&state, principal, params.user_id).await?;
    Ok(Json(serde_json::json!({ "items_count": cart.line_count() })))
}

pub async fn update_item_quantity(
    State(state): State<AppState>,
    principal: Principal,
    Path(line_id): Path<Uuid>,
    Json(req): Json<UpdateQuantityRequest>,
) -> ApiResult<Json<CartResponse>> {
    let mut cart = load_cart(&state, principal, req.user_id).await?;
    cart.set_line_quantity(line_id, req.quantity)?;
    carts::update(&state.db, &cart).await?;
    Ok(Json(CartResponse::from(&cart)))
}

pub async fn delete_item(
    State(state): State<AppState>,
    principal: Principal,
    Path(line_id): Path<Uuid>,
    Query(params): Query<TargetParams>,
) -> ApiResult<Json<CartResponse>> {
    let mut cart = load_cart(&state, principal, params.user_id).await?;
    cart.remove_line(line_id)?;
    carts::update(&state.db, &cart).await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// Clearing the cart deletes the whole aggregate; the next add starts a
/// fresh one.
pub async fn clear_cart(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<TargetParams>,
) -> ApiResult<StatusCode> {
    let cart = load_cart(&state, principal, params.user_id).await?;
    if !carts::delete(&state.db, cart.id()).await? {
        return Err(ApiError::CartNotFound);
    }
    tracing::info!(user_id = %cart.user_id(), "cart cleared");
    Ok(StatusCode::NO_CONTENT)
}
