//! Authorization Gate: the transport-agnostic pass/deny decision
//!
//! Every adapter (gRPC single call, gRPC stream, tower layer, actix
//! middleware) funnels through [`AuthGate::authorize`], so "is authentication
//! required here, and is this caller allowed" means the same thing on every
//! transport. Adapters only differ in where the token comes from and how the
//! resulting [`Claims`] reach the handler.

use crate::authority::TokenAuthority;
use crate::claims::{Claims, UserRole};
use crate::error::AuthError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Capability a hosting service must provide to be put behind the gate.
///
/// Queried once per inbound call; results are never cached by the gate.
pub trait AuthServer: Send + Sync {
    /// Authority used to verify tokens. `None` makes every endpoint public.
    fn token_authority(&self) -> Option<&TokenAuthority>;

    /// Roles allowed on `endpoint` (full gRPC method name or HTTP path).
    /// An empty slice makes the endpoint public.
    fn required_roles(&self, endpoint: &str) -> &[UserRole];
}

impl<T: AuthServer + ?Sized> AuthServer for Arc<T> {
    fn token_authority(&self) -> Option<&TokenAuthority> {
        (**self).token_authority()
    }

    fn required_roles(&self, endpoint: &str) -> &[UserRole] {
        (**self).required_roles(endpoint)
    }
}

/// Table-driven [`AuthServer`] for services without custom policy logic
///
/// ```rust
/// use jwt_security::{AccessPolicy, TokenAuthority, UserRole};
/// use std::time::Duration;
///
/// let authority = TokenAuthority::new("secret", "fleet", Duration::from_secs(3600));
/// let policy = AccessPolicy::new(authority)
///     .allow("/fleet.v1.VehicleService/Delete", [UserRole::Admin])
///     .allow("/api/v1/vehicles", [UserRole::Admin, UserRole::Viewer]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    authority: Option<TokenAuthority>,
    roles: HashMap<String, Vec<UserRole>>,
}

impl AccessPolicy {
    pub fn new(authority: TokenAuthority) -> Self {
        Self {
            authority: Some(authority),
            roles: HashMap::new(),
        }
    }

    /// Policy without an authority: every endpoint is public
    pub fn public() -> Self {
        Self::default()
    }

    /// Allow `roles` on `endpoint`, replacing any earlier entry
    pub fn allow(
        mut self,
        endpoint: impl Into<String>,
        roles: impl IntoIterator<Item = UserRole>,
    ) -> Self {
        self.roles
            .insert(endpoint.into(), roles.into_iter().collect());
        self
    }
}

impl AuthServer for AccessPolicy {
    fn token_authority(&self) -> Option<&TokenAuthority> {
        self.authority.as_ref()
    }

    fn required_roles(&self, endpoint: &str) -> &[UserRole] {
        self.roles.get(endpoint).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Shared decision core, cheap to clone into every adapter
pub struct AuthGate<S> {
    server: Arc<S>,
}

impl<S> Clone for AuthGate<S> {
    fn clone(&self) -> Self {
        Self {
            server: Arc::clone(&self.server),
        }
    }
}

impl<S: AuthServer> AuthGate<S> {
    pub fn new(server: S) -> Self {
        Self {
            server: Arc::new(server),
        }
    }

    pub fn from_arc(server: Arc<S>) -> Self {
        Self { server }
    }

    pub fn server(&self) -> &S {
        &self.server
    }

    /// Decide whether a call to `endpoint` carrying `token` may proceed.
    ///
    /// - `Ok(None)`: endpoint is public, no identity attached
    /// - `Ok(Some(claims))`: caller verified and its role is allowed
    /// - `Err(_)`: deny; the handler must not run
    pub fn authorize(&self, endpoint: &str, token: Option<&str>) -> Result<Option<Claims>, AuthError> {
        let required = self.server.required_roles(endpoint);
        let authority = match self.server.token_authority() {
            Some(authority) if !required.is_empty() => authority,
            _ => {
                debug!(endpoint = %endpoint, "Public endpoint, skipping authentication");
                return Ok(None);
            }
        };

        let result = Self::check(authority, required, token);
        match &result {
            Ok(claims) => debug!(
                endpoint = %endpoint,
                user_id = claims.user_id(),
                role = %claims.role(),
                "Request authorized"
            ),
            Err(e) => warn!(endpoint = %endpoint, reason = %e, "Request denied"),
        }

        result.map(Some)
    }

    fn check(
        authority: &TokenAuthority,
        required: &[UserRole],
        token: Option<&str>,
    ) -> Result<Claims, AuthError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = authority.verify(token)?;

        if !claims.has_any_role(required) {
            return Err(AuthError::RoleMismatch);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::UserIdentity;
    use std::time::Duration;

    const SECRET: &str = "J8Kq2mPvRx4TnZs9YwLcGf7DhBe3Xa6W";
    const DELETE: &str = "/fleet.v1.VehicleService/Delete";
    const LIST: &str = "/fleet.v1.VehicleService/List";

    fn authority() -> TokenAuthority {
        TokenAuthority::new(SECRET, "auth-gate-test", Duration::from_secs(3600))
    }

    fn token_for(role: UserRole) -> String {
        authority()
            .issue(&UserIdentity {
                user_id: 1,
                username: "tester".into(),
                role,
                ..Default::default()
            })
            .unwrap()
    }

    fn gate() -> AuthGate<AccessPolicy> {
        AuthGate::new(AccessPolicy::new(authority()).allow(DELETE, [UserRole::Admin]))
    }

    #[test]
    fn test_admin_passes_with_claims() {
        let claims = gate()
            .authorize(DELETE, Some(&token_for(UserRole::Admin)))
            .unwrap()
            .expect("claims attached");
        assert_eq!(claims.role(), UserRole::Admin);
    }

    #[test]
    fn test_viewer_denied_role_mismatch() {
        let result = gate().authorize(DELETE, Some(&token_for(UserRole::Viewer)));
        assert!(matches!(result, Err(AuthError::RoleMismatch)));
    }

    #[test]
    fn test_missing_and_empty_token() {
        assert!(matches!(
            gate().authorize(DELETE, None),
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            gate().authorize(DELETE, Some("")),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn test_invalid_token_propagates_kind() {
        assert!(matches!(
            gate().authorize(DELETE, Some("garbage")),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_public_endpoint_ignores_token() {
        let gate = gate();
        assert!(gate.authorize(LIST, None).unwrap().is_none());
        assert!(gate.authorize(LIST, Some("garbage")).unwrap().is_none());
        assert!(gate
            .authorize(LIST, Some(&token_for(UserRole::Viewer)))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_empty_role_list_is_public() {
        let gate = AuthGate::new(AccessPolicy::new(authority()).allow(DELETE, Vec::new()));
        assert!(gate.authorize(DELETE, None).unwrap().is_none());
    }

    #[test]
    fn test_no_authority_is_public() {
        let gate = AuthGate::new(AccessPolicy::public().allow(DELETE, [UserRole::Admin]));
        assert!(gate.authorize(DELETE, None).unwrap().is_none());
    }

    #[test]
    fn test_shared_server_through_arc() {
        let policy = Arc::new(AccessPolicy::new(authority()).allow(DELETE, [UserRole::Admin]));
        let gate = AuthGate::new(Arc::clone(&policy));

        assert!(gate
            .authorize(DELETE, Some(&token_for(UserRole::Admin)))
            .unwrap()
            .is_some());
        assert_eq!(policy.required_roles(DELETE), &[UserRole::Admin]);
    }
}
