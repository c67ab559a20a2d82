//! Coupon endpoints: apply/remove against a cart, plus admin CRUD over
//! coupon definitions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::Principal;
use crate::domain::aggregates::coupon::{discount_percent_in_range, Coupon};
use crate::error::{ApiError, ApiResult};
use crate::http::cart_handlers::CartResponse;
use crate::store::coupons::{self, ActivityFilter};
use crate::store::carts;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyCouponRequest {
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, message = "coupon code is required"))]
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct TargetParams {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CouponBreakdown {
    pub sub_total: Decimal,
    pub tax_price: Decimal,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ApplyCouponResponse {
    pub cart: CartResponse,
    pub breakdown: CouponBreakdown,
}

/// Validate the coupon against live cart state and re-run the full
/// pricing recomputation. A second coupon overwrites the first; codes
/// are reusable across carts.
pub async fn apply_coupon(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<ApplyCouponRequest>,
) -> ApiResult<Json<ApplyCouponResponse>> {
    req.validate()?;
    let coupon = coupons::find_by_code(&state.db, &req.code)
        .await?
        .ok_or(ApiError::CouponNotFound)?;
    // Activity is re-derived from the expiry date, never read from a
    // stored flag.
    if !coupon.is_active() {
        return Err(ApiError::CouponInactive);
    }

    let target = principal.resolve_target(req.user_id)?;
    let mut cart = carts::find_by_user(&state.db, target)
        .await?
        .ok_or(ApiError::CartNotFound)?;
    cart.apply_coupon(&coupon.code, coupon.discount_percent);
    carts::update(&state.db, &cart).await?;

    let pre_discount = cart.sub_total() + cart.tax_price();
    let discount_amount = pre_discount - cart.total();
    tracing::info!(user_id = %target, code = %coupon.code, "coupon applied");
    Ok(Json(ApplyCouponResponse {
        breakdown: CouponBreakdown {
            sub_total: cart.sub_total(),
            tax_price: cart.tax_price(),
            discount_percent: cart.discount_percent(),
            discount_amount,
            total: cart.total(),
        },
        cart: CartResponse::from(&cart),
    }))
}

/// Idempotent: removing when no coupon is applied succeeds with the same
/// resulting state.
pub async fn remove_coupon(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<TargetParams>,
) -> ApiResult<Json<CartResponse>> {
    let target = principal.resolve_target(params.user_id)?;
    let mut cart = carts::find_by_user(&state.db, target)
        .await?
        .ok_or(ApiError::CartNotFound)?;
    cart.remove_coupon();
    carts::update(&state.db, &cart).await?;
    Ok(Json(CartResponse::from(&cart)))
}

// --- Admin CRUD -------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CouponDefinitionRequest {
    #[validate(length(min = 1, message = "code is required"))]
    pub code: String,
    pub discount_percent: Decimal,
    pub expiry_date: DateTime<Utc>,
}

impl CouponDefinitionRequest {
    fn check(&self) -> ApiResult<()> {
        self.validate()?;
        if !discount_percent_in_range(self.discount_percent) {
            return Err(ApiError::Validation(
                "discount percent must be between 1 and 100".into(),
            ));
        }
        if self.expiry_date <= Utc::now() {
            return Err(ApiError::Validation("expiry date must be in the future".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CouponListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    /// "all" (default), "true" or "false"; evaluated against the expiry
    /// date at query time.
    pub filter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CouponResponse {
    pub id: Uuid,
    pub code: String,
    pub discount_percent: Decimal,
    pub expiry_date: DateTime<Utc>,
    pub active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Coupon> for CouponResponse {
    fn from(coupon: Coupon) -> Self {
        let active = coupon.is_active();
        Self {
            id: coupon.id,
            code: coupon.code,
            discount_percent: coupon.discount_percent,
            expiry_date: coupon.expiry_date,
            active,
            created_by: coupon.created_by,
            created_at: coupon.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CouponListResponse {
    pub total_coupons: i64,
    pub coupons: Vec<CouponResponse>,
    pub current_page: u32,
    pub total_pages: u32,
}

pub async fn create_coupon(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CouponDefinitionRequest>,
) -> ApiResult<(StatusCode, Json<CouponResponse>)> {
    principal.require_admin()?;
    req.check()?;
    let now = Utc::now();
    let coupon = Coupon {
        id: Uuid::new_v4(),
        code: req.code,
        discount_percent: req.discount_percent,
        expiry_date: req.expiry_date,
        created_by: principal.user_id,
        created_at: now,
        updated_at: now,
    };
    coupons::insert(&state.db, &coupon).await?;
    tracing::info!(code = %coupon.code, "coupon created");
    Ok((StatusCode::CREATED, Json(CouponResponse::from(coupon))))
}

pub async fn update_coupon(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(req): Json<CouponDefinitionRequest>,
) -> ApiResult<Json<CouponResponse>> {
    principal.require_admin()?;
    req.check()?;
    let coupon = coupons::update(&state.db, id, &req.code, req.discount_percent, req.expiry_date)
        .await?
        .ok_or(ApiError::CouponNotFound)?;
    Ok(Json(CouponResponse::from(coupon)))
}

pub async fn delete_coupon(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    principal.require_admin()?;
    if !coupons::delete(&state.db, id).await? {
        return Err(ApiError::CouponNotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_coupons(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<CouponListParams>,
) -> ApiResult<Json<CouponListResponse>> {
    principal.require_admin()?;
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(6).clamp(1, 100);
    let filter = match params.filter.as_deref() {
        None | Some("all") => ActivityFilter::All,
        Some("true") => ActivityFilter::Active,
        Some("false") => ActivityFilter::Inactive,
        Some(other) => {
            return Err(ApiError::Validation(format!("unknown filter '{other}'")));
        }
    };
    let (coupons, total) =
        coupons::list(&state.db, page, limit, params.search.as_deref(), filter).await?;
    let total_pages = (total as u32).div_ceil(limit).max(1);
    Ok(Json(CouponListResponse {
        total_coupons: total,
        coupons: coupons.into_iter().map(CouponResponse::from).collect(),
        current_page: page,
        total_pages,
    }))
}
