//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrowers, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Circulation API",
        version = "1.0.0",
        description = "Library book circulation REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::register_book,
        books::list_books,
        books::book_inventory,
        // Loans
        books::borrow_book,
        books::return_book,
        // Borrowers
        borrowers::register_borrower,
    ),
    components(
        schemas(
            crate::models::Book,
            crate::models::BookDto,
            crate::models::BookInventory,
            crate::models::RegisterBook,
            crate::models::Borrower,
            crate::models::RegisterBorrower,
            crate::models::Loan,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "loans", description = "Borrowing and returning copies"),
        (name = "borrowers", description = "Borrower registry")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
