//! Dozan Commerce
//!
//! Self-hosted cart, coupon and order service.
//!
//! ## Features
//! - Shopping cart with line-item merging and derived totals
//! - Percentage coupons with time-bounded validity
//! - Atomic checkout into immutable orders
//! - Admin order lifecycle management

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod store;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
}

pub use http::router;
