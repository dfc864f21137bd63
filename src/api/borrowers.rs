//! Borrower endpoints

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{Borrower, RegisterBorrower},
    AppState,
};

/// Register a borrower
#[utoipa::path(
    post,
    path = "/library/borrowers",
    tag = "borrowers",
    request_body = RegisterBorrower,
    responses(
        (status = 201, description = "Borrower registered", body = Borrower),
        (status = 400, description = "Blank name or malformed email", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn register_borrower(
    State(state): State<AppState>,
    Json(request): Json<RegisterBorrower>,
) -> AppResult<(StatusCode, Json<Borrower>)> {
    request.validate()?;

    let borrower = state.services.borrowers.register_borrower(request.into()).await?;
    Ok((StatusCode::CREATED, Json(borrower)))
}
