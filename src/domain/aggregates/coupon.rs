//! Coupon Aggregate
//!
//! A reusable, time-bounded percentage discount. Activity is always
//! derived from the expiry date at evaluation time; a stored flag would
//! go stale.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub discount_percent: Decimal,
    pub expiry_date: DateTime<Utc>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expiry_date
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }
}

/// Bounds for a coupon's discount percentage: strictly positive, at most
/// the whole amount.
pub fn discount_percent_in_range(percent: Decimal) -> bool {
    percent > Decimal::ZERO && percent <= Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(expiry: DateTime<Utc>) -> Coupon {
        Coupon {
            id: Uuid::from_u128(1),
            code: "SAVE10".into(),
            discount_percent: Decimal::new(10, 0),
            expiry_date: expiry,
            created_by: Uuid::from_u128(2),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_activity_derived_from_expiry() {
        let now = Utc::now();
        assert!(coupon(now + Duration::days(1)).is_active_at(now));
        assert!(!coupon(now - Duration::seconds(1)).is_active_at(now));
        // Expiry instant itself still counts as active.
        assert!(coupon(now).is_active_at(now));
    }

    #[test]
    fn test_discount_percent_bounds() {
        assert!(discount_percent_in_range(Decimal::new(1, 0)));
        assert!(discount_percent_in_range(Decimal::new(100, 0)));
        assert!(discount_percent_in_range(Decimal::new(25, 1)));
        assert!(!discount_percent_in_range(Decimal::ZERO));
        assert!(!discount_percent_in_range(Decimal::new(101, 0)));
        assert!(!discount_percent_in_range(Decimal::new(-5, 0)));
    }
}
