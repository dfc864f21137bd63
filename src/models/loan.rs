//! Loan model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Loan as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: Uuid,
    pub book_id: Uuid,
    pub borrower_id: Uuid,
    pub borrowed_at: DateTime<Utc>,
    /// None while the loan is active
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub book_id: Uuid,
    pub borrower_id: Uuid,
    pub borrowed_at: DateTime<Utc>,
}
