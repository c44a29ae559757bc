use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::{AppState, errors::AppError, models::Claims, session::Session, utils::decode_jwt};

/// Authentication middleware validating JWT access tokens.
///
/// On success the caller's [`Session`] is inserted into the request extensions.
///
/// # Errors
/// Returns unauthorized if the token is missing, invalid or a refresh token, and
/// `RateLimited` once the caller exceeds its quota.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;
    let claims: Claims = decode_jwt(token, &state.config)?;
    if claims.refresh {
        return Err(AppError::Unauthorized);
    }

    if state.rate_limiter.check_key(&claims.sub).is_err() {
        return Err(AppError::RateLimited);
    }

    req.extensions_mut().insert(Session::new(claims.sub));

    Ok(next.run(req).await)
}
