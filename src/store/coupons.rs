//! Coupon repository.
//!
//! Coupons carry no stored "active" flag; activity is always evaluated
//! against `expiry_date`, both in Rust and in the listing filter.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::Coupon;
use crate::error::{ApiError, ApiResult};

#[derive(sqlx::FromRow)]
struct CouponRow {
    id: Uuid,
    code: String,
    discount_percent: Decimal,
    expiry_date: DateTime<Utc>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CouponRow> for Coupon {
    fn from(row: CouponRow) -> Self {
        Coupon {
            id: row.id,
            code: row.code,
            discount_percent: row.discount_percent,
            expiry_date: row.expiry_date,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Listing filter on derived activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityFilter {
    All,
    Active,
    Inactive,
}

pub async fn find_by_code(pool: &PgPool, code: &str) -> ApiResult<Option<Coupon>> {
    let row = sqlx::query_as::<_, CouponRow>("SELECT * FROM coupons WHERE code = $1")
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Coupon::from))
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> ApiResult<Option<Coupon>> {
    let row = sqlx::query_as::<_, CouponRow>("SELECT * FROM coupons WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Coupon::from))
}

/// A duplicate code is a caller mistake, not an internal failure. Both
/// the create and the rename path can trip the unique index.
fn map_code_conflict(err: sqlx::Error) -> ApiError {
    match err {
        sqlx::Error::Database(e) if e.is_unique_violation() => {
            ApiError::Validation("a coupon with this code already exists".into())
        }
        other => other.into(),
    }
}

pub async fn insert(pool: &PgPool, coupon: &Coupon) -> ApiResult<()> {
    sqlx::query(
        "INSERT INTO coupons (id, code, discount_percent, expiry_date, created_by, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(coupon.id)
    .bind(&coupon.code)
    .bind(coupon.discount_percent)
    .bind(coupon.expiry_date)
    .bind(coupon.created_by)
    .bind(coupon.created_at)
    .bind(coupon.updated_at)
    .execute(pool)
    .await
    .map_err(map_code_conflict)?;
    Ok(())
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    code: &str,
    discount_percent: Decimal,
    expiry_date: DateTime<Utc>,
) -> ApiResult<Option<Coupon>> {
    let row = sqlx::query_as::<_, CouponRow>(
        "UPDATE coupons SET code = $2, discount_percent = $3, expiry_date = $4, updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(code)
    .bind(discount_percent)
    .bind(expiry_date)
    .fetch_optional(pool)
    .await
    .map_err(map_code_conflict)?;
    Ok(row.map(Coupon::from))
}

pub async fn delete(pool: &PgPool, id: Uuid) -> ApiResult<bool> {
    let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list(
    pool: &PgPool,
    page: u32,
    limit: u32,
    search: Option<&str>,
    filter: ActivityFilter,
) -> ApiResult<(Vec<Coupon>, i64)> {
    let pattern = search.map(|s| format!("%{s}%"));
    let activity = match filter {
        ActivityFilter::All => None,
        ActivityFilter::Active => Some(true),
        ActivityFilter::Inactive => Some(false),
    };
    let rows = sqlx::query_as::<_, CouponRow>(
        "SELECT * FROM coupons \
         WHERE ($1::TEXT IS NULL OR code ILIKE $1) \
           AND ($2::BOOL IS NULL OR (expiry_date >= NOW()) = $2) \
         ORDER BY created_at DESC LIMIT $3 OFFSET $4",
    )
    .bind(pattern.as_deref())
    .bind(activity)
    .bind(i64::from(limit))
    .bind(crate::store::page_offset(page, limit))
    .fetch_all(pool)
    .await?;
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM coupons \
         WHERE ($1::TEXT IS NULL OR code ILIKE $1) \
           AND ($2::BOOL IS NULL OR (expiry_date >= NOW()) = $2)",
    )
    .bind(pattern.as_deref())
    .bind(activity)
    .fetch_one(pool)
    .await?;
    Ok((rows.into_iter().map(Coupon::from).collect(), total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct StubDbError(sqlx::error::ErrorKind);

    impl std::fmt::Display for StubDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "stub database error")
        }
    }

    impl std::error::Error for StubDbError {}

    impl sqlx::error::DatabaseError for StubDbError {
        fn message(&self) -> &str {
            "stub database error"
        }
        fn kind(&self) -> sqlx::error::ErrorKind {
            match self.0 {
                sqlx::error::ErrorKind::UniqueViolation => sqlx::error::ErrorKind::UniqueViolation,
                _ => sqlx::error::ErrorKind::Other,
            }
        }
        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }
        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }
        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn test_duplicate_code_maps_to_validation() {
        let err = sqlx::Error::Database(Box::new(StubDbError(sqlx::error::ErrorKind::UniqueViolation)));
        assert!(matches!(map_code_conflict(err), ApiError::Validation(_)));
    }

    #[test]
    fn test_other_database_errors_stay_internal() {
        let err = sqlx::Error::Database(Box::new(StubDbError(sqlx::error::ErrorKind::Other)));
        assert!(matches!(map_code_conflict(err), ApiError::Database(_)));
        assert!(matches!(map_code_conflict(sqlx::Error::RowNotFound), ApiError::Database(_)));
    }
}
