//! Roles and the signed-in identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Permission level attached to a credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access.
    Admin,
    /// Regular operator.
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

/// The user currently signed in.
///
/// Produced by [`CredentialStore::authenticate`](super::CredentialStore::authenticate)
/// and held by the session controller. Absence of a value means nobody is
/// signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    username: String,
    role: Role,
}

impl SessionIdentity {
    /// Create an identity for a verified user.
    #[must_use]
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// True iff the role is [`Role::Admin`].
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.role)
    }
}
