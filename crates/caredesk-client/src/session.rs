//! Client-side session context
//!
//! A session is an explicit value passed around by the dashboards, never an
//! ambient global. It lives from `establish_session` (after login/register)
//! to `clear_session` (logout), and every outgoing call reads the token from
//! it.

use caredesk_db::Role;
use serde::{Deserialize, Serialize};

/// The identity half of a session, as returned by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
}

/// Proof of a prior login plus the cached identity it belongs to
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    identity: Identity,
}

impl Session {
    pub fn new(token: String, identity: Identity) -> Self {
        Self { token, identity }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn role(&self) -> Role {
        self.identity.role
    }

    /// Replace the cached identity with a freshly fetched profile, keeping
    /// the token. The cached-plus-refresh policy: the token is still the
    /// proof, the profile is just a display cache.
    pub fn merge_identity(&mut self, fresh: Identity) {
        self.identity = fresh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str) -> Identity {
        Identity {
            id: 1,
            name: name.to_string(),
            email: "p@x.com".to_string(),
            role: Role::Patient,
            contact: None,
            age: None,
            specialization: None,
        }
    }

    #[test]
    fn test_merge_keeps_token() {
        let mut session = Session::new("tok".to_string(), identity("Old Name"));
        session.merge_identity(identity("New Name"));
        assert_eq!(session.token(), "tok");
        assert_eq!(session.identity().name, "New Name");
    }
}
