use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::errors::ServiceError;

/// Identity attached to each request by the fronting proxy. The proxy
/// terminates the session and forwards the resolved user in headers;
/// this service only enforces role checks and records the actor in the
/// audit trail.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub user_id: Option<i32>,
    pub is_admin: bool,
    pub remote_addr: Option<String>,
}

impl AuthContext {
    pub fn user(user_id: i32) -> Self {
        Self {
            user_id: Some(user_id),
            is_admin: false,
            remote_addr: None,
        }
    }

    pub fn admin(user_id: i32) -> Self {
        Self {
            user_id: Some(user_id),
            is_admin: true,
            remote_addr: None,
        }
    }

    /// Any authenticated user.
    pub fn require_user(&self) -> Result<i32, ServiceError> {
        self.user_id
            .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))
    }

    pub fn require_admin(&self) -> Result<i32, ServiceError> {
        let user_id = self.require_user()?;
        if !self.is_admin {
            return Err(ServiceError::Forbidden(
                "Administrator access required".to_string(),
            ));
        }
        Ok(user_id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_i32 = |name: &str| -> Option<i32> {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
        };
        let header_str = |name: &str| -> Option<String> {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        };

        let is_admin = header_str("x-user-admin")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(AuthContext {
            user_id: header_i32("x-user-id"),
            is_admin,
            remote_addr: header_str("x-forwarded-for"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn anonymous_context_is_rejected() {
        let ctx = AuthContext::default();
        assert_matches!(ctx.require_user(), Err(ServiceError::Unauthorized(_)));
        assert_matches!(ctx.require_admin(), Err(ServiceError::Unauthorized(_)));
    }

    #[test]
    fn non_admin_cannot_pass_admin_check() {
        let ctx = AuthContext::user(7);
        assert_eq!(ctx.require_user().unwrap(), 7);
        assert_matches!(ctx.require_admin(), Err(ServiceError::Forbidden(_)));
        assert_eq!(AuthContext::admin(1).require_admin().unwrap(), 1);
    }
}
