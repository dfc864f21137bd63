//! Repository layer: the transactional store contract and its backends

pub mod memory;
pub mod postgres;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::StoreResult,
    models::{Book, Borrower, Loan, NewBook, NewBorrower, NewLoan},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Unique constraint guarding borrower emails
pub const BORROWER_EMAIL_CONSTRAINT: &str = "borrowers_email_key";

/// Partial unique index allowing one unreturned loan per book
pub const ACTIVE_LOAN_CONSTRAINT: &str = "loans_one_active_per_book";

/// Transaction isolation level requested from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl Isolation {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Isolation::ReadCommitted => "READ COMMITTED",
            Isolation::RepeatableRead => "REPEATABLE READ",
            Isolation::Serializable => "SERIALIZABLE",
        }
    }
}

/// Entry point of a store backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Open a transaction at the given isolation level
    async fn begin(&self, isolation: Isolation) -> StoreResult<Box<dyn StoreTransaction>>;
}

/// Unit of work against the store.
///
/// Writes become visible to other transactions only after [`commit`]. Dropping
/// a transaction without committing discards its writes.
///
/// [`commit`]: StoreTransaction::commit
#[async_trait]
pub trait StoreTransaction: Send {
    async fn find_book_by_id(&mut self, id: Uuid) -> StoreResult<Option<Book>>;

    async fn find_books_by_isbn(&mut self, isbn: &str) -> StoreResult<Vec<Book>>;

    /// Persist a new copy with `borrowed = false` and `version = 0`
    async fn insert_book(&mut self, book: &NewBook) -> StoreResult<Book>;

    /// Persist `book` if the stored version still equals `book.version`.
    ///
    /// Returns the stored row with its version incremented, or
    /// `StoreError::OptimisticConflict` when the row changed underneath.
    async fn update_book(&mut self, book: &Book) -> StoreResult<Book>;

    async fn list_all_books(&mut self) -> StoreResult<Vec<Book>>;

    async fn find_borrower_by_email(&mut self, email: &str) -> StoreResult<Option<Borrower>>;

    async fn find_borrower_by_id(&mut self, id: Uuid) -> StoreResult<Option<Borrower>>;

    /// Fails with a violation of [`BORROWER_EMAIL_CONSTRAINT`] on a taken email
    async fn insert_borrower(&mut self, borrower: &NewBorrower) -> StoreResult<Borrower>;

    async fn find_active_loan_by_book_id(&mut self, book_id: Uuid) -> StoreResult<Option<Loan>>;

    /// Fails with a violation of [`ACTIVE_LOAN_CONSTRAINT`] if the book is on loan
    async fn insert_loan(&mut self, loan: &NewLoan) -> StoreResult<Loan>;

    /// Close an active loan; conflicts if it was already closed elsewhere
    async fn update_loan(&mut self, loan: &Loan) -> StoreResult<Loan>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
