//! Order Aggregate
//!
//! An immutable snapshot of a checked-out cart. Items, prices and the
//! order number are fixed at creation; only the lifecycle status (and
//! payment status) may change afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::cart::{Cart, CartLine};
use crate::domain::value_objects::AppliedCoupon;

/// Human-readable order number prefix.
pub const ORDER_NUMBER_PREFIX: &str = "DOZ";

/// Lifecycle states. Any admin may set any member of this set on any
/// order; there is deliberately no transition table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
    Restitute,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Restitute => "Restitute",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(Self::Pending),
            "Processing" => Some(Self::Processing),
            "Completed" => Some(Self::Completed),
            "Cancelled" => Some(Self::Cancelled),
            "Restitute" => Some(Self::Restitute),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Completed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Completed" => Some(Self::Completed),
            "Cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Opaque card data supplied at checkout. Stored as given, never
/// validated or charged.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub card_number: String,
    pub card_holder_name: String,
    pub expiration_date: String,
    pub cvv: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub items: Vec<CartLine>,
    pub payment_details: PaymentDetails,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub sub_total: Decimal,
    pub tax_price: Decimal,
    pub discount_percent: Decimal,
    pub applied_coupon: Option<AppliedCoupon>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Materialize an order from a cart: deep-copy the lines and the
    /// already-computed money fields, and stamp the allocated sequence
    /// number. Nothing is recomputed here.
    pub fn materialize(
        sequence: i64,
        cart: &Cart,
        payment_details: PaymentDetails,
        payment_method: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_number: format!("{ORDER_NUMBER_PREFIX}{sequence}"),
            user_id: cart.user_id(),
            items: cart.items().to_vec(),
            payment_details,
            payment_method,
            payment_status: PaymentStatus::default(),
            sub_total: cart.sub_total(),
            tax_price: cart.tax_price(),
            discount_percent: cart.discount_percent(),
            applied_coupon: cart.applied_coupon().cloned(),
            total: cart.total(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::cart::NewLine;

    fn card() -> PaymentDetails {
        PaymentDetails {
            card_number: "4111111111111111".into(),
            card_holder_name: "A. Customer".into(),
            expiration_date: "12/27".into(),
            cvv: "123".into(),
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::Restitute,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("Shipped"), None);
        assert_eq!(OrderStatus::parse("pending"), None);
    }

    #[test]
    fn test_materialize_snapshots_the_cart() {
        let mut cart = Cart::for_user(Uuid::from_u128(5));
        cart.add_item(NewLine {
            product_id: Uuid::from_u128(1),
            title: "Widget".into(),
            unit_price: Decimal::new(2500, 2),
            image: None,
            variant: None,
            inputs: vec![],
            quantity: 2,
        })
        .unwrap();
        cart.add_item(NewLine {
            product_id: Uuid::from_u128(2),
            title: "Gadget".into(),
            unit_price: Decimal::new(999, 2),
            image: None,
            variant: None,
            inputs: vec![],
            quantity: 1,
        })
        .unwrap();
        cart.apply_coupon("SAVE10", Decimal::new(10, 0));

        let order = Order::materialize(42, &cart, card(), "card".into());
        assert_eq!(order.order_number, "DOZ42");
        assert_eq!(order.user_id, cart.user_id());
        assert_eq!(order.items, cart.items().to_vec());
        assert_eq!(order.sub_total, cart.sub_total());
        assert_eq!(order.tax_price, cart.tax_price());
        assert_eq!(order.discount_percent, cart.discount_percent());
        assert_eq!(order.total, cart.total());
        assert_eq!(order.applied_coupon.as_ref().unwrap().code, "SAVE10");
        assert_eq!(order.status, OrderStatus::Pending);
    }
}
