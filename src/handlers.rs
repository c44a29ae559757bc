use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::{
    AppState,
    collection::load_all,
    errors::{AppError, AppResult},
    models::{
        Book, CreateBookRequest, LoginRequest, ProfileSummary, RegisterRequest, StatusUpdate,
        TokenResponse, UpdateStatusRequest, UserResponse,
    },
    profile,
    session::Session,
    utils::{create_jwt_tokens, decode_jwt},
};

/// Health check endpoint.
#[must_use]
#[allow(clippy::unused_async)]
pub async fn health_check() -> &'static str {
    "OK"
}

/// Register a new user and write their profile document.
///
/// # Errors
/// Returns validation errors or identity/backend errors.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let (session, user) =
        profile::register(state.identity.as_ref(), state.store.as_ref(), payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: session.user_id().to_string(),
            name: user.name,
            email: user.email,
        }),
    ))
}

/// Authenticate a user and return JWT tokens.
///
/// # Errors
/// Returns validation, invalid credentials, or backend errors.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    payload.validate()?;

    let user_id = state
        .identity
        .verify_credentials(&payload.email, &payload.password)
        .await?;

    let (access, refresh) = create_jwt_tokens(&user_id, &state.config)?;
    Ok((
        StatusCode::OK,
        Json(TokenResponse {
            access_token: access,
            refresh_token: refresh,
        }),
    ))
}

/// Refresh JWT tokens using a refresh token.
///
/// # Errors
/// Returns unauthorized errors or token decoding errors.
#[allow(clippy::unused_async)]
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TokenResponse>,
) -> AppResult<Json<TokenResponse>> {
    let claims = decode_jwt(&body.refresh_token, &state.config)?;
    if !claims.refresh {
        return Err(AppError::Unauthorized);
    }
    let (access, refresh) = create_jwt_tokens(&claims.sub, &state.config)?;
    Ok(Json(TokenResponse {
        access_token: access,
        refresh_token: refresh,
    }))
}

/// List the caller's books.
///
/// # Errors
/// Returns backend errors.
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<Vec<Book>>> {
    let books = load_all(state.store.as_ref(), &session).await?;
    Ok(Json(books))
}

/// Create a new book owned by the authenticated user.
///
/// # Errors
/// Returns validation or backend errors.
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(payload): Json<CreateBookRequest>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.books.create(&session, payload).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Get a single book by id.
///
/// # Errors
/// Returns not found or backend errors.
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.books.get(&session, &id).await?;
    Ok(Json(book))
}

/// Change a book's reading status.
///
/// # Errors
/// Returns validation, not found or backend errors.
pub async fn update_book_status(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> AppResult<Json<StatusUpdate>> {
    let update = state.books.update_status(&session, &id, &body.status).await?;
    Ok(Json(update))
}

/// Permanently delete a book.
///
/// # Errors
/// Returns not found or backend errors.
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.books.delete(&session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Profile document and reading statistics for the caller.
///
/// # Errors
/// Returns backend errors.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<ProfileSummary>> {
    let summary = profile::load_profile(state.store.as_ref(), &session).await?;
    Ok(Json(summary))
}
