//! Author model and related types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Registered author; owns the books that reference its id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Author {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Create author request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[validate(length(min = 1, message = "author name must not be empty"))]
    pub name: String,
    pub bio: Option<String>,
}
