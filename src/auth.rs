//! Authorization guard interface.
//!
//! Token verification happens upstream (API gateway); this service only
//! consumes the verified principal it forwards in the `x-user-id` and
//! `x-user-role` headers. A missing or malformed principal rejects the
//! request before any handler logic runs.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customer" => Some(Self::Customer),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// The authenticated caller, as vouched for by the gateway.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Ownership check used by every cart and order operation: the
    /// principal must be the owner, or an admin.
    pub fn can_act_for(&self, owner: Uuid) -> bool {
        self.is_admin() || self.user_id == owner
    }

    /// Resolve which user a request targets. Only admins may act on a
    /// cart other than their own.
    pub fn resolve_target(&self, requested: Option<Uuid>) -> Result<Uuid, ApiError> {
        match requested {
            None => Ok(self.user_id),
            Some(target) if self.can_act_for(target) => Ok(target),
            Some(_) => Err(ApiError::Unauthorized),
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthenticated)
        };
        let user_id = Uuid::parse_str(header(USER_ID_HEADER)?).map_err(|_| ApiError::Unauthenticated)?;
        let role = Role::parse(header(USER_ROLE_HEADER)?).ok_or(ApiError::Unauthenticated)?;
        Ok(Principal { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal { user_id: Uuid::from_u128(1), role }
    }

    #[test]
    fn test_owner_or_admin() {
        let customer = principal(Role::Customer);
        assert!(customer.can_act_for(Uuid::from_u128(1)));
        assert!(!customer.can_act_for(Uuid::from_u128(2)));
        let admin = principal(Role::Admin);
        assert!(admin.can_act_for(Uuid::from_u128(2)));
    }

    #[test]
    fn test_resolve_target() {
        let customer = principal(Role::Customer);
        assert_eq!(customer.resolve_target(None).unwrap(), customer.user_id);
        assert_eq!(customer.resolve_target(Some(customer.user_id)).unwrap(), customer.user_id);
        assert!(customer.resolve_target(Some(Uuid::from_u128(2))).is_err());
        let admin = principal(Role::Admin);
        assert_eq!(admin.resolve_target(Some(Uuid::from_u128(2))).unwrap(), Uuid::from_u128(2));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("customer"), Some(Role::Customer));
        assert_eq!(Role::parse("root"), None);
    }
}
