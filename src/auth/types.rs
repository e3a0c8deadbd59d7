use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Dev,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Dev => "dev",
            Role::User => "user",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Role::Admin),
            "dev" => Ok(Role::Dev),
            "user" => Ok(Role::User),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session JWT payload.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id
    pub role: Role,
    pub iat: usize,
    pub exp: usize, // unix seconds
}

/// What the bearer string turned out to be, before the user row is consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Session { user_id: Uuid, role: Role, exp: usize },
    ApiToken { token_id: Uuid, user_id: Uuid, role: Role },
}

impl Credential {
    pub fn user_id(&self) -> Uuid {
        match self {
            Credential::Session { user_id, .. } | Credential::ApiToken { user_id, .. } => *user_id,
        }
    }

    pub fn kind(&self) -> CredentialKind {
        match self {
            Credential::Session { .. } => CredentialKind::Session,
            Credential::ApiToken { .. } => CredentialKind::ApiToken,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Session,
    ApiToken,
}

/// The authenticated caller, resolved once per request and consumed by the
/// authorization policy and every service downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub must_change_password: bool,
    pub credential: CredentialKind,
}

impl Principal {
    /// API tokens are exempt from the forced password change gate.
    pub fn password_change_pending(&self) -> bool {
        self.must_change_password && self.credential == CredentialKind::Session
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug)]
pub struct SessionToken {
    pub token: String,
    pub role: Role,
    pub must_change_password: bool,
    pub expires_in: usize,
}
