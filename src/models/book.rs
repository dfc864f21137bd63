//! Book (physical copy) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Book copy as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub isbn: String,
    pub title: String,
    pub author: String,
    #[sqlx(rename = "is_borrowed")]
    pub borrowed: bool,
    /// Incremented by the store on every persisted update
    pub version: i64,
}

impl Book {
    /// Whether this copy carries the given bibliographic data
    pub fn same_edition(&self, title: &str, author: &str) -> bool {
        self.title == title && self.author == author
    }
}

/// Insert payload for a new copy; id and version are assigned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub isbn: String,
    pub title: String,
    pub author: String,
}

/// Register book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterBook {
    #[validate(custom(function = "not_blank", message = "ISBN is required"))]
    pub isbn: String,
    #[validate(custom(function = "not_blank", message = "Title is required"))]
    pub title: String,
    #[validate(custom(function = "not_blank", message = "Author is required"))]
    pub author: String,
}

impl From<RegisterBook> for NewBook {
    fn from(request: RegisterBook) -> Self {
        Self {
            isbn: request.isbn,
            title: request.title,
            author: request.author,
        }
    }
}

/// Book projection returned by catalog listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookDto {
    pub id: Uuid,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub borrowed: bool,
    pub version: i64,
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            isbn: book.isbn,
            title: book.title,
            author: book.author,
            borrowed: book.borrowed,
            version: book.version,
        }
    }
}

/// Copies held per ISBN
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookInventory {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub number_of_copies: usize,
    /// Copies with no active loan
    pub available_copies: usize,
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
