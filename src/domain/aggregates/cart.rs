//! Cart Aggregate
//!
//! One mutable pending-purchase aggregate per user. Owns the line items
//! and every derived money field; totals are recomputed in full after
//! each mutation, never patched incrementally.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{round2, AppliedCoupon, CustomInput, VariantSelection, TAX_RATE};

/// One purchasable selection inside a cart. `unit_price` is copied from
/// the catalog at add time; later catalog changes do not touch it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<VariantSelection>,
    #[serde(default)]
    pub inputs: Vec<CustomInput>,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// An incoming "add to cart" request, before it is matched against the
/// existing lines.
#[derive(Clone, Debug)]
pub struct NewLine {
    pub product_id: Uuid,
    pub title: String,
    pub unit_price: Decimal,
    pub image: Option<String>,
    pub variant: Option<VariantSelection>,
    pub inputs: Vec<CustomInput>,
    pub quantity: u32,
}

impl CartLine {
    /// Whether this line represents the same purchasable selection as the
    /// incoming request. All three conditions must hold:
    ///
    /// 1. same product,
    /// 2. if the request names a variant selection, it must equal this
    ///    line's selection; a request with no selection matches any
    ///    (wildcard, deliberately asymmetric),
    /// 3. the request's inputs are empty, or element-wise equal to this
    ///    line's inputs (same values, same order, same length).
    fn matches(&self, incoming: &NewLine) -> bool {
        if self.product_id != incoming.product_id {
            return false;
        }
        let variant_ok = match incoming.variant.as_ref().and_then(VariantSelection::selection_title) {
            None => true,
            Some(title) => {
                self.variant.as_ref().and_then(VariantSelection::selection_title) == Some(title)
            }
        };
        let inputs_ok = incoming.inputs.is_empty()
            || (self.inputs.len() == incoming.inputs.len()
                && self
                    .inputs
                    .iter()
                    .zip(&incoming.inputs)
                    .all(|(a, b)| a.value == b.value));
        variant_ok && inputs_ok
    }

    fn recompute_total(&mut self) {
        self.line_total = round2(self.unit_price * Decimal::from(self.quantity));
    }
}

#[derive(Clone, Debug)]
pub struct Cart {
    id: Uuid,
    user_id: Uuid,
    items: Vec<CartLine>,
    sub_total: Decimal,
    tax_price: Decimal,
    discount_percent: Decimal,
    applied_coupon: Option<AppliedCoupon>,
    total: Decimal,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("quantity must be a positive number")]
    InvalidQuantity,
    #[error("item not found in cart")]
    LineNotFound,
}

impl Cart {
    /// A fresh, empty cart for a user. Created lazily on the first
    /// "add item" request.
    pub fn for_user(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            items: vec![],
            sub_total: Decimal::ZERO,
            tax_price: Decimal::ZERO,
            discount_percent: Decimal::ZERO,
            applied_coupon: None,
            total: Decimal::ZERO,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a cart from its persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        user_id: Uuid,
        items: Vec<CartLine>,
        sub_total: Decimal,
        tax_price: Decimal,
        discount_percent: Decimal,
        applied_coupon: Option<AppliedCoupon>,
        total: Decimal,
        version: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            items,
            sub_total,
            tax_price,
            discount_percent,
            applied_coupon,
            total,
            version,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn items(&self) -> &[CartLine] { &self.items }
    pub fn line_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn sub_total(&self) -> Decimal { self.sub_total }
    pub fn tax_price(&self) -> Decimal { self.tax_price }
    pub fn discount_percent(&self) -> Decimal { self.discount_percent }
    pub fn applied_coupon(&self) -> Option<&AppliedCoupon> { self.applied_coupon.as_ref() }
    pub fn total(&self) -> Decimal { self.total }
    pub fn version(&self) -> i64 { self.version }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Add a line, merging into an existing line when the identity rule
    /// in [`CartLine::matches`] says the selection is the same.
    pub fn add_item(&mut self, incoming: NewLine) -> Result<(), CartError> {
        if incoming.quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        match self.items.iter_mut().find(|line| line.matches(&incoming)) {
            Some(existing) => {
                existing.quantity += incoming.quantity;
                existing.recompute_total();
            }
            None => {
                let mut line = CartLine {
                    id: Uuid::new_v4(),
                    product_id: incoming.product_id,
                    title: incoming.title,
                    unit_price: incoming.unit_price,
                    image: incoming.image,
                    variant: incoming.variant,
                    inputs: incoming.inputs,
                    quantity: incoming.quantity,
                    line_total: Decimal::ZERO,
                };
                line.recompute_total();
                self.items.push(line);
            }
        }
        self.recalculate();
        Ok(())
    }

    /// Replace a line's quantity. Quantities below 1 are rejected;
    /// removal is a separate operation.
    pub fn set_line_quantity(&mut self, line_id: Uuid, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let line = self
            .items
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or(CartError::LineNotFound)?;
        line.quantity = quantity;
        line.recompute_total();
        self.recalculate();
        Ok(())
    }

    pub fn remove_line(&mut self, line_id: Uuid) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|l| l.id != line_id);
        if self.items.len() == before {
            return Err(CartError::LineNotFound);
        }
        self.recalculate();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.recalculate();
    }

    /// Overwrites any previously applied coupon; codes do not stack.
    pub fn apply_coupon(&mut self, code: &str, discount_percent: Decimal) {
        self.discount_percent = discount_percent;
        self.applied_coupon = Some(AppliedCoupon {
            code: code.to_string(),
            discount_percent,
        });
        self.recalculate();
    }

    /// Idempotent: removing when no coupon is applied leaves the same state.
    pub fn remove_coupon(&mut self) {
        self.discount_percent = Decimal::ZERO;
        self.applied_coupon = None;
        self.recalculate();
    }

    /// Full pricing recomputation, run after every mutation:
    /// subtotal, 5% tax, then the discount over the tax-inclusive amount.
    fn recalculate(&mut self) {
        let sub: Decimal = self.items.iter().map(|l| l.line_total).sum();
        self.sub_total = round2(sub);
        self.tax_price = round2(self.sub_total * TAX_RATE);
        let pre_discount = self.sub_total + self.tax_price;
        let discount_amount = pre_discount * (self.discount_percent / Decimal::ONE_HUNDRED);
        self.total = round2(pre_discount - discount_amount);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(quantity: u32) -> NewLine {
        NewLine {
            product_id: Uuid::from_u128(1),
            title: "Widget".into(),
            unit_price: Decimal::new(1000, 2),
            image: None,
            variant: None,
            inputs: vec![],
            quantity,
        }
    }

    fn with_variant(mut line: NewLine, selection: &str) -> NewLine {
        line.variant = Some(VariantSelection {
            title: "Color".into(),
            details: Some(crate::domain::value_objects::VariantDetails { title: selection.into() }),
        });
        line
    }

    fn with_inputs(mut line: NewLine, values: &[&str]) -> NewLine {
        line.inputs = values
            .iter()
            .map(|v| CustomInput { label: "Engraving".into(), value: (*v).into() })
            .collect();
        line
    }

    #[test]
    fn test_same_selection_merges_into_one_line() {
        let mut cart = Cart::for_user(Uuid::from_u128(9));
        cart.add_item(widget(2)).unwrap();
        cart.add_item(widget(3)).unwrap();
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.items()[0].line_total, Decimal::new(5000, 2));
    }

    #[test]
    fn test_differing_inputs_create_distinct_lines() {
        let mut cart = Cart::for_user(Uuid::from_u128(9));
        cart.add_item(with_inputs(widget(1), &["Alice"])).unwrap();
        cart.add_item(with_inputs(widget(1), &["Bob"])).unwrap();
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_request_without_variant_is_a_wildcard() {
        let mut cart = Cart::for_user(Uuid::from_u128(9));
        cart.add_item(with_variant(widget(1), "Red")).unwrap();
        // No variant on the request side: merges into the variant line.
        cart.add_item(widget(2)).unwrap();
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        // A different explicit variant does not merge.
        cart.add_item(with_variant(widget(1), "Blue")).unwrap();
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_zero_quantity_rejected_before_matching() {
        let mut cart = Cart::for_user(Uuid::from_u128(9));
        assert_eq!(cart.add_item(widget(0)), Err(CartError::InvalidQuantity));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_subtotal_tracks_line_totals() {
        let mut cart = Cart::for_user(Uuid::from_u128(9));
        cart.add_item(widget(2)).unwrap();
        let mut other = widget(1);
        other.product_id = Uuid::from_u128(2);
        other.unit_price = Decimal::new(499, 2);
        cart.add_item(other).unwrap();
        let expected: Decimal = cart.items().iter().map(|l| l.line_total).sum();
        assert_eq!(cart.sub_total(), expected);

        let line_id = cart.items()[0].id;
        cart.set_line_quantity(line_id, 4).unwrap();
        let expected: Decimal = cart.items().iter().map(|l| l.line_total).sum();
        assert_eq!(cart.sub_total(), expected);

        cart.remove_line(line_id).unwrap();
        assert_eq!(cart.sub_total(), Decimal::new(499, 2));
    }

    #[test]
    fn test_totals_follow_the_pricing_formula() {
        let mut cart = Cart::for_user(Uuid::from_u128(9));
        let mut line = widget(10);
        line.unit_price = Decimal::new(1000, 2); // subtotal 100.00
        cart.add_item(line).unwrap();
        assert_eq!(cart.sub_total(), Decimal::new(10000, 2));
        assert_eq!(cart.tax_price(), Decimal::new(500, 2));
        assert_eq!(cart.total(), Decimal::new(10500, 2));

        cart.apply_coupon("SAVE10", Decimal::new(10, 0));
        assert_eq!(cart.total(), Decimal::new(9450, 2)); // 105 * 0.9

        cart.remove_coupon();
        assert_eq!(cart.total(), Decimal::new(10500, 2));
        // Idempotent removal.
        cart.remove_coupon();
        assert_eq!(cart.total(), Decimal::new(10500, 2));
        assert!(cart.applied_coupon().is_none());
    }

    #[test]
    fn test_second_coupon_overwrites_the_first() {
        let mut cart = Cart::for_user(Uuid::from_u128(9));
        cart.add_item(widget(10)).unwrap();
        cart.apply_coupon("SAVE10", Decimal::new(10, 0));
        cart.apply_coupon("SAVE25", Decimal::new(25, 0));
        assert_eq!(cart.discount_percent(), Decimal::new(25, 0));
        assert_eq!(cart.applied_coupon().unwrap().code, "SAVE25");
        assert_eq!(cart.total(), Decimal::new(7875, 2)); // 105 * 0.75
    }

    #[test]
    fn test_set_quantity_validates() {
        let mut cart = Cart::for_user(Uuid::from_u128(9));
        cart.add_item(widget(1)).unwrap();
        let line_id = cart.items()[0].id;
        assert_eq!(cart.set_line_quantity(line_id, 0), Err(CartError::InvalidQuantity));
        assert_eq!(cart.set_line_quantity(Uuid::from_u128(77), 2), Err(CartError::LineNotFound));
        cart.set_line_quantity(line_id, 2).unwrap();
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_remove_unknown_line_is_an_error() {
        let mut cart = Cart::for_user(Uuid::from_u128(9));
        cart.add_item(widget(1)).unwrap();
        assert_eq!(cart.remove_line(Uuid::from_u128(77)), Err(CartError::LineNotFound));
        assert_eq!(cart.line_count(), 1);
    }

    #[test]
    fn test_clear_resets_totals() {
        let mut cart = Cart::for_user(Uuid::from_u128(9));
        cart.add_item(widget(3)).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.sub_total(), Decimal::ZERO);
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let mut cart = Cart::for_user(Uuid::from_u128(9));
        cart.add_item(widget(3)).unwrap();
        cart.apply_coupon("SAVE10", Decimal::new(10, 0));
        let (sub, tax, total) = (cart.sub_total(), cart.tax_price(), cart.total());
        cart.recalculate();
        assert_eq!((cart.sub_total(), cart.tax_price(), cart.total()), (sub, tax, total));
    }
}
