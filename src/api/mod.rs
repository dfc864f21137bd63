//! API handlers for the circulation REST endpoints

pub mod books;
pub mod borrowers;
pub mod health;
pub mod openapi;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Catalog
        .route("/library/books", get(books::list_books))
        .route("/library/books", post(books::register_book))
        .route("/library/books/inventory", get(books::book_inventory))
        // Loans
        .route(
            "/library/books/:book_id/borrow/:borrower_id",
            post(books::borrow_book),
        )
        .route("/library/books/:book_id/return", post(books::return_book))
        // Borrowers
        .route("/library/borrowers", post(borrowers::register_borrower))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
