//! Loan state machine
//!
//! A book is either available or borrowed; the state is the book's
//! `borrowed` flag together with at most one unreturned loan. Transitions on
//! one book run one at a time under its entry in the lock table, and every
//! attempt persists through a serializable, version-checked transaction so
//! writers outside this process cannot be silently overwritten.

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
    config::LoansConfig,
    error::{AppError, AppResult, StoreError},
    models::loan::{Loan, NewLoan},
    repository::{Isolation, LibraryStore, ACTIVE_LOAN_CONSTRAINT},
};

use super::{locks::LockTable, retry::with_optimistic_retry, Clock};

#[derive(Clone)]
pub struct LoansService {
    store: Arc<dyn LibraryStore>,
    locks: Arc<LockTable<Uuid>>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
    lock_timeout: Option<Duration>,
}

fn already_borrowed(book_id: Uuid) -> AppError {
    AppError::BookAlreadyBorrowed(format!("Book {} is borrowed already", book_id))
}

impl LoansService {
    pub fn new(store: Arc<dyn LibraryStore>, config: LoansConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            locks: Arc::new(LockTable::new()),
            clock,
            max_attempts: config.max_attempts,
            lock_timeout: config.lock_timeout(),
        }
    }

    /// Lend `book_id` to `borrower_id`
    pub async fn borrow_book(&self, book_id: Uuid, borrower_id: Uuid) -> AppResult<Loan> {
        let _guard = self.locks.acquire_within(&book_id, self.lock_timeout).await?;

        with_optimistic_retry(self.max_attempts, || self.try_borrow(book_id, borrower_id)).await
    }

    async fn try_borrow(&self, book_id: Uuid, borrower_id: Uuid) -> AppResult<Loan> {
        let mut tx = self.store.begin(Isolation::Serializable).await?;

        let mut book = tx
            .find_book_by_id(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", book_id)))?;

        if book.borrowed {
            return Err(already_borrowed(book_id));
        }

        let borrower = tx
            .find_borrower_by_id(borrower_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrower {} not found", borrower_id)))?;

        book.borrowed = true;
        tx.update_book(&book).await?;

        // The partial unique index catches a borrow committed by another process
        let on_loan_elsewhere = |err: StoreError| {
            if err.violates(ACTIVE_LOAN_CONSTRAINT) {
                already_borrowed(book_id)
            } else {
                AppError::Store(err)
            }
        };

        let loan = tx
            .insert_loan(&NewLoan {
                book_id,
                borrower_id: borrower.id,
                borrowed_at: self.clock.now(),
            })
            .await
            .map_err(on_loan_elsewhere)?;

        tx.commit().await.map_err(on_loan_elsewhere)?;
        Ok(loan)
    }

    /// Close the active loan of `book_id` and make the book available again
    pub async fn return_book(&self, book_id: Uuid) -> AppResult<Loan> {
        let _guard = self.locks.acquire_within(&book_id, self.lock_timeout).await?;

        with_optimistic_retry(self.max_attempts, || self.try_return(book_id)).await
    }

    async fn try_return(&self, book_id: Uuid) -> AppResult<Loan> {
        let mut tx = self.store.begin(Isolation::Serializable).await?;

        let mut loan = tx
            .find_active_loan_by_book_id(book_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No active loan found for book {}", book_id))
            })?;

        let mut book = tx.find_book_by_id(loan.book_id).await?.ok_or_else(|| {
            AppError::Internal(format!("Active loan {} references missing book {}", loan.id, book_id))
        })?;

        book.borrowed = false;
        tx.update_book(&book).await?;

        loan.returned_at = Some(self.clock.now());
        let loan = tx.update_loan(&loan).await?;

        tx.commit().await?;
        Ok(loan)
    }
}
