//! Acting-user context
//!
//! Loans change state on behalf of a named user holding named
//! capabilities. The core only ever sees the [`ActingUser`] trait; the
//! HTTP layer fulfills it from trusted identity headers set by the
//! upstream reverse proxy.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Closed set of permissions relevant to loan state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ReceiveSignedContracts,
    ReceiveLoans,
}

impl Capability {
    /// Wire name as carried in identity headers and permission stores.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ReceiveSignedContracts => "receive signed contracts",
            Capability::ReceiveLoans => "receive loans",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "receive signed contracts" => Some(Capability::ReceiveSignedContracts),
            "receive loans" => Some(Capability::ReceiveLoans),
            _ => None,
        }
    }
}

/// The user a create or update runs as. Passed explicitly into every
/// operation that needs it; the core holds no current-user state.
pub trait ActingUser: Send + Sync {
    fn id(&self) -> &str;
    fn can(&self, capability: Capability) -> bool;
}

/// Acting user extracted from `x-user-id` / `x-user-capabilities` headers.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
    pub capabilities: Vec<Capability>,
}

impl ActingUser for CurrentUser {
    fn id(&self) -> &str {
        &self.user_id
    }

    fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Error response for missing or malformed identity headers.
#[derive(Debug, Serialize)]
struct AuthError {
    error: AuthErrorDetails,
}

#[derive(Debug, Serialize)]
struct AuthErrorDetails {
    code: String,
    message: String,
}

impl AuthError {
    fn new(code: &str, message: &str) -> Self {
        Self {
            error: AuthErrorDetails {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AuthError::new("MISSING_IDENTITY", "x-user-id header is required").into_response()
            })?
            .to_string();

        // Unknown capability names are ignored rather than rejected; the
        // guard only acts on the closed set.
        let capabilities = parts
            .headers
            .get("x-user-capabilities")
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                v.split(',')
                    .filter_map(|name| Capability::from_name(name.trim()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(CurrentUser {
            user_id,
            capabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_wire_names_round_trip() {
        for capability in [Capability::ReceiveSignedContracts, Capability::ReceiveLoans] {
            assert_eq!(Capability::from_name(capability.as_str()), Some(capability));
        }
        assert_eq!(Capability::from_name("drop tables"), None);
    }

    #[test]
    fn test_current_user_capability_check() {
        let clerk = CurrentUser {
            user_id: "clerk-1".to_string(),
            capabilities: vec![Capability::ReceiveSignedContracts],
        };
        assert_eq!(clerk.id(), "clerk-1");
        assert!(clerk.can(Capability::ReceiveSignedContracts));
        assert!(!clerk.can(Capability::ReceiveLoans));
    }
}
