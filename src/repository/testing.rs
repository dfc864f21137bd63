//! Fault injection around [`MemoryStore`] for exercising race paths

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::StoreResult,
    models::{Book, Borrower, Loan, NewBook, NewBorrower, NewLoan},
};

use super::{Isolation, LibraryStore, MemoryStore, StoreTransaction};

#[derive(Debug, Default)]
struct Faults {
    /// Upcoming book updates that race with an out-of-band writer
    interfering_updates: AtomicUsize,
    /// Borrower lookups by email miss, as if a concurrent insert were invisible
    hide_borrower_emails: AtomicBool,
    begins: AtomicUsize,
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[derive(Debug, Clone)]
pub(crate) struct FaultyStore {
    inner: MemoryStore,
    faults: Arc<Faults>,
}

impl FaultyStore {
    pub(crate) fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            faults: Arc::new(Faults::default()),
        }
    }

    /// The next `times` book updates are preceded by a committed write to the
    /// same row from outside the caller's transaction
    pub(crate) fn interfere_with_book_updates(&self, times: usize) {
        self.faults.interfering_updates.store(times, Ordering::SeqCst);
    }

    pub(crate) fn hide_borrower_emails(&self) {
        self.faults.hide_borrower_emails.store(true, Ordering::SeqCst);
    }

    pub(crate) fn begin_count(&self) -> usize {
        self.faults.begins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LibraryStore for FaultyStore {
    async fn begin(&self, isolation: Isolation) -> StoreResult<Box<dyn StoreTransaction>> {
        self.faults.begins.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.begin(isolation).await?;
        Ok(Box::new(FaultyTransaction {
            inner,
            store: self.inner.clone(),
            faults: Arc::clone(&self.faults),
        }))
    }
}

struct FaultyTransaction {
    inner: Box<dyn StoreTransaction>,
    store: MemoryStore,
    faults: Arc<Faults>,
}

#[async_trait]
impl StoreTransaction for FaultyTransaction {
    async fn find_book_by_id(&mut self, id: Uuid) -> StoreResult<Option<Book>> {
        self.inner.find_book_by_id(id).await
    }

    async fn find_books_by_isbn(&mut self, isbn: &str) -> StoreResult<Vec<Book>> {
        self.inner.find_books_by_isbn(isbn).await
    }

    async fn insert_book(&mut self, book: &NewBook) -> StoreResult<Book> {
        self.inner.insert_book(book).await
    }

    async fn update_book(&mut self, book: &Book) -> StoreResult<Book> {
        if take_one(&self.faults.interfering_updates) {
            let mut other = self.store.begin(Isolation::Serializable).await?;
            if let Some(current) = other.find_book_by_id(book.id).await? {
                other.update_book(&current).await?;
                other.commit().await?;
            }
        }
        self.inner.update_book(book).await
    }

    async fn list_all_books(&mut self) -> StoreResult<Vec<Book>> {
        self.inner.list_all_books().await
    }

    async fn find_borrower_by_email(&mut self, email: &str) -> StoreResult<Option<Borrower>> {
        if self.faults.hide_borrower_emails.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_borrower_by_email(email).await
    }

    async fn find_borrower_by_id(&mut self, id: Uuid) -> StoreResult<Option<Borrower>> {
        self.inner.find_borrower_by_id(id).await
    }

    async fn insert_borrower(&mut self, borrower: &NewBorrower) -> StoreResult<Borrower> {
        self.inner.insert_borrower(borrower).await
    }

    async fn find_active_loan_by_book_id(&mut self, book_id: Uuid) -> StoreResult<Option<Loan>> {
        self.inner.find_active_loan_by_book_id(book_id).await
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> StoreResult<Loan> {
        self.inner.insert_loan(loan).await
    }

    async fn update_loan(&mut self, loan: &Loan) -> StoreResult<Loan> {
        self.inner.update_loan(loan).await
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.inner.commit().await
    }
}
