//! PostgreSQL store backend

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{StoreError, StoreResult},
    models::{Book, Borrower, Loan, NewBook, NewBorrower, NewLoan},
};

use super::{Isolation, LibraryStore, StoreTransaction};

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl LibraryStore for PgStore {
    async fn begin(&self, isolation: Isolation) -> StoreResult<Box<dyn StoreTransaction>> {
        let mut tx = self.pool.begin().await?;

        // Must be the first statement of the transaction
        let set_isolation = format!("SET TRANSACTION ISOLATION LEVEL {}", isolation.as_sql());
        sqlx::query(&set_isolation).execute(&mut *tx).await?;

        Ok(Box::new(PgStoreTransaction { tx }))
    }
}

pub struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn find_book_by_id(&mut self, id: Uuid) -> StoreResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(book)
    }

    async fn find_books_by_isbn(&mut self, isbn: &str) -> StoreResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE isbn = $1 ORDER BY created_at, id",
        )
        .bind(isbn)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(books)
    }

    async fn insert_book(&mut self, book: &NewBook) -> StoreResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, isbn, title, author, is_borrowed, version)
            VALUES ($1, $2, $3, $4, FALSE, 0)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(created)
    }

    async fn update_book(&mut self, book: &Book) -> StoreResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET isbn = $3, title = $4, author = $5, is_borrowed = $6, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(book.id)
        .bind(book.version)
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.borrowed)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(StoreError::OptimisticConflict {
            entity: "book",
            id: book.id,
        })
    }

    async fn list_all_books(&mut self) -> StoreResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY isbn, created_at, id")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(books)
    }

    async fn find_borrower_by_email(&mut self, email: &str) -> StoreResult<Option<Borrower>> {
        let borrower = sqlx::query_as::<_, Borrower>("SELECT * FROM borrowers WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(borrower)
    }

    async fn find_borrower_by_id(&mut self, id: Uuid) -> StoreResult<Option<Borrower>> {
        let borrower = sqlx::query_as::<_, Borrower>("SELECT * FROM borrowers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(borrower)
    }

    async fn insert_borrower(&mut self, borrower: &NewBorrower) -> StoreResult<Borrower> {
        let created = sqlx::query_as::<_, Borrower>(
            "INSERT INTO borrowers (id, name, email) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&borrower.name)
        .bind(&borrower.email)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(created)
    }

    async fn find_active_loan_by_book_id(&mut self, book_id: Uuid) -> StoreResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE book_id = $1 AND returned_at IS NULL",
        )
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(loan)
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> StoreResult<Loan> {
        let created = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (id, book_id, borrower_id, borrowed_at, returned_at)
            VALUES ($1, $2, $3, $4, NULL)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(loan.book_id)
        .bind(loan.borrower_id)
        .bind(loan.borrowed_at)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(created)
    }

    async fn update_loan(&mut self, loan: &Loan) -> StoreResult<Loan> {
        sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET returned_at = $2
            WHERE id = $1 AND returned_at IS NULL
            RETURNING *
            "#,
        )
        .bind(loan.id)
        .bind(loan.returned_at)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(StoreError::OptimisticConflict {
            entity: "loan",
            id: loan.id,
        })
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
