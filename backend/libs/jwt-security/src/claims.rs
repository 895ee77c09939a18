//! Claim model carried inside signed tokens
//!
//! Registered JWT fields use their standard names; application fields use the
//! short keys shared with the other services (`id`, `un`, `ua`, `ip`, `em`, `rl`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permission class of a caller.
///
/// Serialized as its integer discriminant so tokens stay compatible with
/// services that define the same enumeration in their protobuf schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum UserRole {
    #[default]
    Unspecified = 0,
    Admin = 1,
    Operator = 2,
    Viewer = 3,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Unspecified,
        UserRole::Admin,
        UserRole::Operator,
        UserRole::Viewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Unspecified => "unspecified",
            UserRole::Admin => "admin",
            UserRole::Operator => "operator",
            UserRole::Viewer => "viewer",
        }
    }
}

impl TryFrom<i32> for UserRole {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UserRole::Unspecified),
            1 => Ok(UserRole::Admin),
            2 => Ok(UserRole::Operator),
            3 => Ok(UserRole::Viewer),
            other => Err(format!("unknown user role {other}")),
        }
    }
}

impl From<UserRole> for i32 {
    fn from(role: UserRole) -> Self {
        role as i32
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown user role '{s}'"))
    }
}

/// Identity fields supplied by the caller when a token is issued
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: u32,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    /// User-agent of the login request, if known
    pub user_agent: Option<String>,
    /// Originating IP of the login request, if known
    pub ip: Option<String>,
}

impl UserIdentity {
    /// Display name used as the token subject
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Verified identity extracted from a token.
///
/// Fields are read-only; values are produced by
/// [`TokenAuthority::verify`](crate::TokenAuthority::verify). There is no
/// `Deserialize` impl, so a `Claims` cannot be built from unsigned input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    pub(crate) iss: String,
    pub(crate) sub: String,
    pub(crate) jti: String,
    pub(crate) iat: i64,
    pub(crate) nbf: i64,
    pub(crate) exp: i64,

    #[serde(rename = "id")]
    pub(crate) user_id: u32,
    #[serde(rename = "un", default)]
    pub(crate) username: String,
    #[serde(rename = "ua", default, skip_serializing_if = "String::is_empty")]
    pub(crate) user_agent: String,
    #[serde(rename = "ip", default, skip_serializing_if = "String::is_empty")]
    pub(crate) ip: String,
    #[serde(rename = "em", default)]
    pub(crate) email: String,
    #[serde(rename = "rl")]
    pub(crate) role: UserRole,
}

/// Payload as decoded from the wire, before the time window is checked
#[derive(Deserialize)]
pub(crate) struct UnverifiedClaims {
    iss: String,
    sub: String,
    jti: String,
    iat: i64,
    nbf: i64,
    exp: i64,

    #[serde(rename = "id")]
    user_id: u32,
    #[serde(rename = "un", default)]
    username: String,
    #[serde(rename = "ua", default)]
    user_agent: String,
    #[serde(rename = "ip", default)]
    ip: String,
    #[serde(rename = "em", default)]
    email: String,
    #[serde(rename = "rl")]
    role: UserRole,
}

impl From<UnverifiedClaims> for Claims {
    fn from(raw: UnverifiedClaims) -> Self {
        Claims {
            iss: raw.iss,
            sub: raw.sub,
            jti: raw.jti,
            iat: raw.iat,
            nbf: raw.nbf,
            exp: raw.exp,
            user_id: raw.user_id,
            username: raw.username,
            user_agent: raw.user_agent,
            ip: raw.ip,
            email: raw.email,
            role: raw.role,
        }
    }
}

impl Claims {
    pub fn issuer(&self) -> &str {
        &self.iss
    }

    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Unique token identifier
    pub fn token_id(&self) -> &str {
        &self.jti
    }

    pub fn issued_at(&self) -> i64 {
        self.iat
    }

    pub fn not_before(&self) -> i64 {
        self.nbf
    }

    pub fn expires_at(&self) -> i64 {
        self.exp
    }

    pub fn user_id(&self) -> u32 {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn user_agent(&self) -> Option<&str> {
        Some(self.user_agent.as_str()).filter(|ua| !ua.is_empty())
    }

    pub fn ip(&self) -> Option<&str> {
        Some(self.ip.as_str()).filter(|ip| !ip.is_empty())
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    /// Whether the claim's role is one of `roles`
    pub fn has_any_role(&self, roles: &[UserRole]) -> bool {
        roles.contains(&self.role)
    }
}
