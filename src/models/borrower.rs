//! Borrower identity, supplied by the authentication collaborator

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque borrower identifier (username, email, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct BorrowerId(pub String);

impl BorrowerId {
    /// Borrower recorded for loans migrated from counter-only documents
    pub const ANONYMOUS: &'static str = "anonymous";

    pub fn anonymous() -> Self {
        BorrowerId(Self::ANONYMOUS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BorrowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BorrowerId {
    fn from(s: &str) -> Self {
        BorrowerId(s.to_string())
    }
}

impl From<String> for BorrowerId {
    fn from(s: String) -> Self {
        BorrowerId(s)
    }
}

/// Borrower role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Member
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Member
    }
}
