//! Value objects shared by the cart and order aggregates.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Flat tax rate applied to every cart subtotal. A system constant, not
/// configurable per cart.
pub const TAX_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2); // 0.05

/// Round a money amount to two decimal places, half away from zero.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// One free-form answer the buyer supplied for a line item
/// (e.g. an engraving text). Order matters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomInput {
    pub label: String,
    pub value: String,
}

/// The buyer's variant choice for a product: a variant group title plus
/// the concrete selection within it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSelection {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<VariantDetails>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDetails {
    pub title: String,
}

impl VariantSelection {
    /// The title that identifies the concrete selection for line-matching
    /// purposes. Empty titles count as "no selection".
    pub fn selection_title(&self) -> Option<&str> {
        self.details
            .as_ref()
            .map(|d| d.title.as_str())
            .filter(|t| !t.is_empty())
    }
}

/// Coupon data frozen onto a cart (and later an order) at apply time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount_percent: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_is_five_percent() {
        assert_eq!(TAX_RATE, Decimal::new(5, 2));
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(Decimal::new(10005, 3)), Decimal::new(1001, 2)); // 10.005 -> 10.01
        assert_eq!(round2(Decimal::new(-10005, 3)), Decimal::new(-1001, 2));
        assert_eq!(round2(Decimal::new(123449, 4)), Decimal::new(1234, 2)); // 12.3449 -> 12.34
    }

    #[test]
    fn test_selection_title_ignores_empty() {
        let v = VariantSelection { title: "Size".into(), details: Some(VariantDetails { title: String::new() }) };
        assert_eq!(v.selection_title(), None);
        let v = VariantSelection { title: "Size".into(), details: Some(VariantDetails { title: "XL".into() }) };
        assert_eq!(v.selection_title(), Some("XL"));
        let v = VariantSelection { title: "Size".into(), details: None };
        assert_eq!(v.selection_title(), None);
    }
}
