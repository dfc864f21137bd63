//! Catalog management service

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use crate::{
    config::LoansConfig,
    error::{AppError, AppResult},
    models::book::{Book, BookDto, BookInventory, NewBook},
    repository::{Isolation, LibraryStore},
};

use super::{locks::LockTable, retry::with_optimistic_retry};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn LibraryStore>,
    /// Serializes registrations of the same ISBN within this process
    isbn_locks: Arc<LockTable<String>>,
    max_attempts: u32,
    lock_timeout: Option<Duration>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn LibraryStore>, config: LoansConfig) -> Self {
        Self {
            store,
            isbn_locks: Arc::new(LockTable::new()),
            max_attempts: config.max_attempts,
            lock_timeout: config.lock_timeout(),
        }
    }

    /// Register a new physical copy.
    ///
    /// Copies sharing an ISBN must carry the same title and author; a new
    /// copy of an already registered edition is accepted as another copy.
    pub async fn register_book(&self, book: NewBook) -> AppResult<Book> {
        let _guard = self
            .isbn_locks
            .acquire_within(&book.isbn, self.lock_timeout)
            .await?;

        with_optimistic_retry(self.max_attempts, || self.try_register(&book)).await
    }

    async fn try_register(&self, book: &NewBook) -> AppResult<Book> {
        let mut tx = self.store.begin(Isolation::Serializable).await?;

        let existing = tx.find_books_by_isbn(&book.isbn).await?;
        if let Some(first) = existing.first() {
            if !first.same_edition(&book.title, &book.author) {
                return Err(AppError::InvalidBookData(format!(
                    "ISBN {} is already registered as \"{}\" by {}",
                    book.isbn, first.title, first.author
                )));
            }
        }

        let created = tx.insert_book(book).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// List every copy in the catalog
    pub async fn list_books(&self) -> AppResult<Vec<BookDto>> {
        let books = self.all_books().await?;
        Ok(books.into_iter().map(BookDto::from).collect())
    }

    /// Copies per ISBN, ordered by ISBN
    pub async fn book_inventory(&self) -> AppResult<Vec<BookInventory>> {
        let mut inventory: BTreeMap<String, BookInventory> = BTreeMap::new();

        for book in self.all_books().await? {
            let entry = inventory
                .entry(book.isbn.clone())
                .or_insert_with(|| BookInventory {
                    isbn: book.isbn.clone(),
                    title: book.title.clone(),
                    author: book.author.clone(),
                    number_of_copies: 0,
                    available_copies: 0,
                });
            entry.number_of_copies += 1;
            if !book.borrowed {
                entry.available_copies += 1;
            }
        }

        Ok(inventory.into_values().collect())
    }

    async fn all_books(&self) -> AppResult<Vec<Book>> {
        let mut tx = self.store.begin(Isolation::ReadCommitted).await?;
        let books = tx.list_all_books().await?;
        tx.commit().await?;
        Ok(books)
    }
}
