//! Cart repository.
//!
//! The cart is a read-modify-write aggregate shared by concurrent
//! requests for the same user, so every update is conditional on the
//! version stamp the caller loaded. A lost race surfaces as a conflict
//! instead of silently overwriting the other writer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::cart::{Cart, CartLine};
use crate::domain::value_objects::AppliedCoupon;
use crate::error::{ApiError, ApiResult};

#[derive(sqlx::FromRow)]
struct CartRow {
    id: Uuid,
    user_id: Uuid,
    items: Json<Vec<CartLine>>,
    sub_total: Decimal,
    tax_price: Decimal,
    discount_percent: Decimal,
    applied_coupon: Option<Json<AppliedCoupon>>,
    total: Decimal,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Cart::restore(
            row.id,
            row.user_id,
            row.items.0,
            row.sub_total,
            row.tax_price,
            row.discount_percent,
            row.applied_coupon.map(|c| c.0),
            row.total,
            row.version,
            row.created_at,
            row.updated_at,
        )
    }
}

pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> ApiResult<Option<Cart>> {
    let row = sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Cart::from))
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> ApiResult<Option<Cart>> {
    let row = sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Cart::from))
}

/// First write of a lazily created cart. The unique constraint on
/// `user_id` turns a concurrent double-create into a conflict.
pub async fn insert(pool: &PgPool, cart: &Cart) -> ApiResult<()> {
    let result = sqlx::query(
        "INSERT INTO carts (id, user_id, items, sub_total, tax_price, discount_percent, \
         applied_coupon, total, version, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $10)",
    )
    .bind(cart.id())
    .bind(cart.user_id())
    .bind(Json(cart.items()))
    .bind(cart.sub_total())
    .bind(cart.tax_price())
    .bind(cart.discount_percent())
    .bind(cart.applied_coupon().map(Json))
    .bind(cart.total())
    .bind(cart.created_at())
    .bind(cart.updated_at())
    .execute(pool)
    .await;
    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(ApiError::Conflict),
        Err(e) => Err(e.into()),
    }
}

/// Conditional write: succeeds only if the row still carries the version
/// the cart was loaded with, and bumps it. Fails with a conflict when
/// another writer got there first.
pub async fn update(pool: &PgPool, cart: &Cart) -> ApiResult<()> {
    let result = sqlx::query(
        "UPDATE carts SET items = $3, sub_total = $4, tax_price = $5, discount_percent = $6, \
         applied_coupon = $7, total = $8, version = version + 1, updated_at = $9 \
         WHERE id = $1 AND version = $2",
    )
    .bind(cart.id())
    .bind(cart.version())
    .bind(Json(cart.items()))
    .bind(cart.sub_total())
    .bind(cart.tax_price())
    .bind(cart.discount_percent())
    .bind(cart.applied_coupon().map(Json))
    .bind(cart.total())
    .bind(cart.updated_at())
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict);
    }
    Ok(())
}

/// Persist a mutated cart, inserting on first use.
pub async fn save(pool: &PgPool, cart: &Cart, existed: bool) -> ApiResult<()> {
    if existed {
        update(pool, cart).await
    } else {
        insert(pool, cart).await
    }
}

pub async fn delete(pool: &PgPool, id: Uuid) -> ApiResult<bool> {
    let result = sqlx::query("DELETE FROM carts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
