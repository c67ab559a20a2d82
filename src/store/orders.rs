//! Order repository.
//!
//! Checkout is the one multi-step write in the system: allocate the next
//! order number, insert the order snapshot, delete the source cart. All
//! three run in a single transaction so no partial state is ever visible.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::cart::{Cart, CartLine};
use crate::domain::aggregates::order::{Order, OrderStatus, PaymentDetails, PaymentStatus};
use crate::domain::value_objects::AppliedCoupon;
use crate::error::{ApiError, ApiResult};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    user_id: Uuid,
    items: Json<Vec<CartLine>>,
    payment_details: Json<PaymentDetails>,
    payment_method: String,
    payment_status: String,
    sub_total: Decimal,
    tax_price: Decimal,
    discount_percent: Decimal,
    applied_coupon: Option<Json<AppliedCoupon>>,
    total: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = ApiError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::parse(&row.status)
            .ok_or_else(|| ApiError::Internal(anyhow!("unknown order status '{}'", row.status)))?;
        let payment_status = PaymentStatus::parse(&row.payment_status).ok_or_else(|| {
            ApiError::Internal(anyhow!("unknown payment status '{}'", row.payment_status))
        })?;
        Ok(Order {
            id: row.id,
            order_number: row.order_number,
            user_id: row.user_id,
            items: row.items.0,
            payment_details: row.payment_details.0,
            payment_method: row.payment_method,
            payment_status,
            sub_total: row.sub_total,
            tax_price: row.tax_price,
            discount_percent: row.discount_percent,
            applied_coupon: row.applied_coupon.map(|c| c.0),
            total: row.total,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Projection used by the admin listing.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub total: Decimal,
    pub status: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

/// Materialize the cart into an order atomically.
///
/// The cart delete is version-guarded: if a concurrent mutation (or a
/// second checkout) touched the cart after it was loaded, the whole
/// transaction rolls back and the caller sees a conflict.
pub async fn checkout(
    pool: &PgPool,
    cart: &Cart,
    payment_details: PaymentDetails,
    payment_method: String,
) -> ApiResult<Order> {
    let mut tx = pool.begin().await?;

    let sequence: i64 =
        sqlx::query_scalar("UPDATE order_sequence SET value = value + 1 WHERE id = 1 RETURNING value")
            .fetch_one(&mut *tx)
            .await?;
    let order = Order::materialize(sequence, cart, payment_details, payment_method);

    sqlx::query(
        "INSERT INTO orders (id, order_number, user_id, items, payment_details, payment_method, \
         payment_status, sub_total, tax_price, discount_percent, applied_coupon, total, status, \
         created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(order.user_id)
    .bind(Json(&order.items))
    .bind(Json(&order.payment_details))
    .bind(&order.payment_method)
    .bind(order.payment_status.as_str())
    .bind(order.sub_total)
    .bind(order.tax_price)
    .bind(order.discount_percent)
    .bind(order.applied_coupon.as_ref().map(Json))
    .bind(order.total)
    .bind(order.status.as_str())
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *tx)
    .await?;

    let deleted = sqlx::query("DELETE FROM carts WHERE id = $1 AND version = $2")
        .bind(cart.id())
        .bind(cart.version())
        .execute(&mut *tx)
        .await?;
    if deleted.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(ApiError::Conflict);
    }

    tx.commit().await?;
    Ok(order)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> ApiResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Order::try_from).transpose()
}

pub async fn list(
    pool: &PgPool,
    page: u32,
    limit: u32,
    status: Option<OrderStatus>,
    search: Option<&str>,
) -> ApiResult<(Vec<OrderSummary>, i64)> {
    let status = status.map(|s| s.as_str());
    let pattern = search.map(|s| format!("%{s}%"));
    let orders = sqlx::query_as::<_, OrderSummary>(
        "SELECT id, order_number, user_id, total, status, payment_status, created_at FROM orders \
         WHERE ($1::TEXT IS NULL OR status = $1) \
           AND ($2::TEXT IS NULL OR order_number ILIKE $2) \
         ORDER BY created_at DESC LIMIT $3 OFFSET $4",
    )
    .bind(status)
    .bind(pattern.as_deref())
    .bind(i64::from(limit))
    .bind(crate::store::page_offset(page, limit))
    .fetch_all(pool)
    .await?;
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM orders \
         WHERE ($1::TEXT IS NULL OR status = $1) \
           AND ($2::TEXT IS NULL OR order_number ILIKE $2)",
    )
    .bind(status)
    .bind(pattern.as_deref())
    .fetch_one(pool)
    .await?;
    Ok((orders, total))
}

pub async fn update_status(pool: &PgPool, id: Uuid, status: OrderStatus) -> ApiResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(
        "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?;
    row.map(Order::try_from).transpose()
}

pub async fn delete(pool: &PgPool, id: Uuid) -> ApiResult<bool> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
