//! API error taxonomy.
//!
//! Every failure a handler can surface maps to a machine-readable kind
//! plus an HTTP status class. Validation and authorization failures are
//! raised before any state is touched.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::domain::aggregates::CartError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("quantity must be a positive number")]
    InvalidQuantity,

    #[error("missing or invalid credentials")]
    Unauthenticated,

    #[error("unauthorized")]
    Unauthorized,

    #[error("cart not found")]
    CartNotFound,

    #[error("item not found in cart")]
    LineNotFound,

    #[error("invalid coupon code")]
    CouponNotFound,

    #[error("order not found")]
    OrderNotFound,

    #[error("this coupon has expired")]
    CouponInactive,

    #[error("the cart was modified concurrently, reload and retry")]
    Conflict,

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidQuantity => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::CartNotFound | Self::LineNotFound | Self::CouponNotFound | Self::OrderNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::CouponInactive | Self::Conflict => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::CartNotFound => "CART_NOT_FOUND",
            Self::LineNotFound => "LINE_NOT_FOUND",
            Self::CouponNotFound => "COUPON_NOT_FOUND",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::CouponInactive => "COUPON_INACTIVE",
            Self::Conflict => "CONFLICT",
            Self::Database(_) | Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, kind = self.kind(), "request rejected");
        }
        let message = match &self {
            // Internal detail stays in the logs.
            Self::Database(_) | Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };
        let body = json!({
            "status": status.as_u16(),
            "error": self.kind(),
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::InvalidQuantity => Self::InvalidQuantity,
            CartError::LineNotFound => Self::LineNotFound,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert_eq!(ApiError::InvalidQuantity.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::CartNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::CouponInactive.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Conflict.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_cart_error_mapping() {
        assert_eq!(ApiError::from(CartError::InvalidQuantity).kind(), "INVALID_QUANTITY");
        assert_eq!(ApiError::from(CartError::LineNotFound).kind(), "LINE_NOT_FOUND");
    }
}
