//! Borrower registration service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult, StoreError},
    models::borrower::{Borrower, NewBorrower},
    repository::{Isolation, LibraryStore, BORROWER_EMAIL_CONSTRAINT},
};

#[derive(Clone)]
pub struct BorrowersService {
    store: Arc<dyn LibraryStore>,
}

fn duplicate_email(email: &str) -> AppError {
    AppError::DuplicateBorrowerEmail(format!("Borrower with email {} already exists", email))
}

impl BorrowersService {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        Self { store }
    }

    /// Register a borrower; emails are unique across all borrowers
    pub async fn register_borrower(&self, borrower: NewBorrower) -> AppResult<Borrower> {
        let email_taken = |err: StoreError| {
            if err.violates(BORROWER_EMAIL_CONSTRAINT) {
                duplicate_email(&borrower.email)
            } else {
                AppError::Store(err)
            }
        };

        let mut tx = self.store.begin(Isolation::RepeatableRead).await?;

        if tx.find_borrower_by_email(&borrower.email).await?.is_some() {
            return Err(duplicate_email(&borrower.email));
        }

        // A concurrent registration may still win between lookup and insert
        let created = tx.insert_borrower(&borrower).await.map_err(email_taken)?;
        tx.commit().await.map_err(email_taken)?;
        Ok(created)
    }
}
