//! Borrower model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::book::not_blank;

/// Borrower as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrower {
    pub id: Uuid,
    pub name: String,
    /// Unique across all borrowers
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBorrower {
    pub name: String,
    pub email: String,
}

/// Register borrower request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterBorrower {
    #[validate(email(message = "Email should be valid"))]
    pub email: String,
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    pub name: String,
}

impl From<RegisterBorrower> for NewBorrower {
    fn from(request: RegisterBorrower) -> Self {
        Self {
            name: request.name,
            email: request.email,
        }
    }
}
