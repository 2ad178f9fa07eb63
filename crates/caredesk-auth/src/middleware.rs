//! Request-level auth gate building blocks
//!
//! The API crate's extractors drive these: bearer extraction, strict claim
//! resolution, then the role check. Authentication always precedes
//! authorization.

use caredesk_db::Role;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AuthError;
use crate::jwt::Claims;

/// Authenticated user information attached to a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    /// Create from JWT claims
    ///
    /// Parsing is strict: a non-numeric subject or a role outside the closed
    /// set is a tampered token, not something to default away.
    pub fn from_claims(claims: &Claims) -> Result<Self, AuthError> {
        let id = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;
        let role = Role::from_str(&claims.role).map_err(|_| AuthError::InvalidToken)?;
        Ok(Self {
            id,
            name: claims.name.clone(),
            role,
        })
    }
}

/// Extract bearer token from an authorization header value
pub fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Second-stage check: is the resolved role in the allowed set?
pub fn authorize(user: &AuthUser, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AuthError::InsufficientPermissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, role: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            name: "Test".to_string(),
            role: role.to_string(),
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn test_from_claims_strict() {
        let user = AuthUser::from_claims(&claims("3", "doctor")).unwrap();
        assert_eq!(user.id, 3);
        assert_eq!(user.role, Role::Doctor);

        assert!(matches!(
            AuthUser::from_claims(&claims("3", "superuser")),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            AuthUser::from_claims(&claims("abc", "doctor")),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc").unwrap(), "abc");
        assert!(extract_bearer_token("Basic abc").is_err());
    }

    #[test]
    fn test_authorize() {
        let user = AuthUser {
            id: 1,
            name: "Test".to_string(),
            role: Role::Patient,
        };
        assert!(authorize(&user, &[Role::Patient, Role::Admin]).is_ok());
        assert!(matches!(
            authorize(&user, &[Role::Admin]),
            Err(AuthError::InsufficientPermissions)
        ));
    }
}
