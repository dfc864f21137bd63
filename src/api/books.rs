//! Catalog and loan endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{Book, BookDto, BookInventory, Loan, RegisterBook},
    AppState,
};

/// Register a new copy of a book
#[utoipa::path(
    post,
    path = "/library/books",
    tag = "books",
    request_body = RegisterBook,
    responses(
        (status = 201, description = "Copy registered", body = Book),
        (status = 400, description = "Blank field or ISBN bound to another title/author", body = crate::error::ErrorResponse),
        (status = 409, description = "Concurrent registration kept conflicting", body = crate::error::ErrorResponse)
    )
)]
pub async fn register_book(
    State(state): State<AppState>,
    Json(request): Json<RegisterBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    request.validate()?;

    let book = state.services.catalog.register_book(request.into()).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// List every copy in the catalog
#[utoipa::path(
    get,
    path = "/library/books",
    tag = "books",
    responses(
        (status = 200, description = "All copies", body = Vec<BookDto>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<BookDto>>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(books))
}

/// Copy counts per ISBN
#[utoipa::path(
    get,
    path = "/library/books/inventory",
    tag = "books",
    responses(
        (status = 200, description = "Inventory by ISBN", body = Vec<BookInventory>)
    )
)]
pub async fn book_inventory(State(state): State<AppState>) -> AppResult<Json<Vec<BookInventory>>> {
    let inventory = state.services.catalog.book_inventory().await?;
    Ok(Json(inventory))
}

/// Lend a copy to a borrower
#[utoipa::path(
    post,
    path = "/library/books/{book_id}/borrow/{borrower_id}",
    tag = "loans",
    params(
        ("book_id" = Uuid, Path, description = "Book copy ID"),
        ("borrower_id" = Uuid, Path, description = "Borrower ID")
    ),
    responses(
        (status = 200, description = "Loan opened", body = Loan),
        (status = 404, description = "Book or borrower not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book already borrowed or retries exhausted", body = crate::error::ErrorResponse),
        (status = 503, description = "Book lock not acquired in time", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    Path((book_id, borrower_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.borrow_book(book_id, borrower_id).await?;
    Ok(Json(loan))
}

/// Return a borrowed copy
#[utoipa::path(
    post,
    path = "/library/books/{book_id}/return",
    tag = "loans",
    params(
        ("book_id" = Uuid, Path, description = "Book copy ID")
    ),
    responses(
        (status = 200, description = "Loan closed", body = Loan),
        (status = 404, description = "No active loan for this book", body = crate::error::ErrorResponse),
        (status = 409, description = "Retries exhausted", body = crate::error::ErrorResponse),
        (status = 503, description = "Book lock not acquired in time", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.return_book(book_id).await?;
    Ok(Json(loan))
}
