//! In-memory store backend for development and tests.
//!
//! Each transaction works on a snapshot of the tables taken at `begin` and
//! records its writes. At commit the writes are replayed against the latest
//! committed tables under an exclusive lock; every write re-checks its
//! preconditions (book version, email uniqueness, one active loan per book),
//! so a transaction that raced with another commit fails instead of
//! overwriting it. The requested isolation level is not otherwise modelled.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    error::{StoreError, StoreResult},
    models::{Book, Borrower, Loan, NewBook, NewBorrower, NewLoan},
};

use super::{
    Isolation, LibraryStore, StoreTransaction, ACTIVE_LOAN_CONSTRAINT, BORROWER_EMAIL_CONSTRAINT,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    books: IndexMap<Uuid, Book>,
    borrowers: IndexMap<Uuid, Borrower>,
    loans: IndexMap<Uuid, Loan>,
}

#[derive(Debug, Clone)]
enum PendingWrite {
    InsertBook(Book),
    /// Carries the version the writer read
    UpdateBook(Book),
    InsertBorrower(Borrower),
    InsertLoan(Loan),
    UpdateLoan(Loan),
}

impl Tables {
    fn active_loan(&self, book_id: Uuid) -> Option<&Loan> {
        self.loans
            .values()
            .find(|loan| loan.book_id == book_id && loan.is_active())
    }

    fn apply(&mut self, write: &PendingWrite) -> StoreResult<()> {
        match write {
            PendingWrite::InsertBook(book) => {
                self.books.insert(book.id, book.clone());
            }
            PendingWrite::UpdateBook(book) => {
                let stored = self
                    .books
                    .get_mut(&book.id)
                    .filter(|stored| stored.version == book.version)
                    .ok_or(StoreError::OptimisticConflict {
                        entity: "book",
                        id: book.id,
                    })?;
                *stored = Book {
                    version: book.version + 1,
                    ..book.clone()
                };
            }
            PendingWrite::InsertBorrower(borrower) => {
                if self.borrowers.values().any(|b| b.email == borrower.email) {
                    return Err(StoreError::UniqueViolation(
                        BORROWER_EMAIL_CONSTRAINT.to_string(),
                    ));
                }
                self.borrowers.insert(borrower.id, borrower.clone());
            }
            PendingWrite::InsertLoan(loan) => {
                if self.active_loan(loan.book_id).is_some() {
                    return Err(StoreError::UniqueViolation(ACTIVE_LOAN_CONSTRAINT.to_string()));
                }
                self.loans.insert(loan.id, loan.clone());
            }
            PendingWrite::UpdateLoan(loan) => {
                let stored = self
                    .loans
                    .get_mut(&loan.id)
                    .filter(|stored| stored.is_active())
                    .ok_or(StoreError::OptimisticConflict {
                        entity: "loan",
                        id: loan.id,
                    })?;
                *stored = loan.clone();
            }
        }
        Ok(())
    }
}

/// Store keeping all records in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every loan ever recorded for a book, oldest first
    pub fn loans_for_book(&self, book_id: Uuid) -> Vec<Loan> {
        self.tables
            .read()
            .loans
            .values()
            .filter(|loan| loan.book_id == book_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    async fn begin(&self, _isolation: Isolation) -> StoreResult<Box<dyn StoreTransaction>> {
        let view = self.tables.read().clone();
        Ok(Box::new(MemoryTransaction {
            tables: Arc::clone(&self.tables),
            view,
            writes: Vec::new(),
        }))
    }
}

struct MemoryTransaction {
    tables: Arc<RwLock<Tables>>,
    view: Tables,
    writes: Vec<PendingWrite>,
}

impl MemoryTransaction {
    fn stage(&mut self, write: PendingWrite) -> StoreResult<()> {
        self.view.apply(&write)?;
        self.writes.push(write);
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn find_book_by_id(&mut self, id: Uuid) -> StoreResult<Option<Book>> {
        Ok(self.view.books.get(&id).cloned())
    }

    async fn find_books_by_isbn(&mut self, isbn: &str) -> StoreResult<Vec<Book>> {
        Ok(self
            .view
            .books
            .values()
            .filter(|book| book.isbn == isbn)
            .cloned()
            .collect())
    }

    async fn insert_book(&mut self, book: &NewBook) -> StoreResult<Book> {
        let created = Book {
            id: Uuid::new_v4(),
            isbn: book.isbn.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            borrowed: false,
            version: 0,
        };
        self.stage(PendingWrite::InsertBook(created.clone()))?;
        Ok(created)
    }

    async fn update_book(&mut self, book: &Book) -> StoreResult<Book> {
        self.stage(PendingWrite::UpdateBook(book.clone()))?;
        Ok(Book {
            version: book.version + 1,
            ..book.clone()
        })
    }

    async fn list_all_books(&mut self) -> StoreResult<Vec<Book>> {
        Ok(self.view.books.values().cloned().collect())
    }

    async fn find_borrower_by_email(&mut self, email: &str) -> StoreResult<Option<Borrower>> {
        Ok(self
            .view
            .borrowers
            .values()
            .find(|borrower| borrower.email == email)
            .cloned())
    }

    async fn find_borrower_by_id(&mut self, id: Uuid) -> StoreResult<Option<Borrower>> {
        Ok(self.view.borrowers.get(&id).cloned())
    }

    async fn insert_borrower(&mut self, borrower: &NewBorrower) -> StoreResult<Borrower> {
        let created = Borrower {
            id: Uuid::new_v4(),
            name: borrower.name.clone(),
            email: borrower.email.clone(),
        };
        self.stage(PendingWrite::InsertBorrower(created.clone()))?;
        Ok(created)
    }

    async fn find_active_loan_by_book_id(&mut self, book_id: Uuid) -> StoreResult<Option<Loan>> {
        Ok(self.view.active_loan(book_id).cloned())
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> StoreResult<Loan> {
        let created = Loan {
            id: Uuid::new_v4(),
            book_id: loan.book_id,
            borrower_id: loan.borrower_id,
            borrowed_at: loan.borrowed_at,
            returned_at: None,
        };
        self.stage(PendingWrite::InsertLoan(created.clone()))?;
        Ok(created)
    }

    async fn update_loan(&mut self, loan: &Loan) -> StoreResult<Loan> {
        self.stage(PendingWrite::UpdateLoan(loan.clone()))?;
        Ok(loan.clone())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let mut next = tables.clone();
        for write in &self.writes {
            next.apply(write)?;
        }
        *tables = next;
        Ok(())
    }
}
