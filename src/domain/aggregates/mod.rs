//! Aggregates module
pub mod cart;
pub mod coupon;
pub mod order;

pub use cart::{Cart, CartError, CartLine, NewLine};
pub use coupon::Coupon;
pub use order::{Order, OrderStatus, PaymentDetails, PaymentStatus};
