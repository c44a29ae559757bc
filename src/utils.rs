use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::Claims,
};
use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use governor::{RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::{num::NonZeroU32, sync::Arc};

pub type KeyedRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Create access and refresh JWT tokens for a user.
///
/// # Errors
/// Returns an error if token encoding fails or time conversion fails.
pub fn create_jwt_tokens(user_id: &str, config: &Config) -> AppResult<(String, String)> {
    let access_ts = (Utc::now() + Duration::minutes(config.access_token_minutes)).timestamp();
    let refresh_ts = (Utc::now() + Duration::days(config.refresh_token_days)).timestamp();
    let access_exp = usize::try_from(access_ts).map_err(|e| AppError::Anyhow(anyhow!(e.to_string())))?;
    let refresh_exp = usize::try_from(refresh_ts).map_err(|e| AppError::Anyhow(anyhow!(e.to_string())))?;

    let access_claims = Claims {
        sub: user_id.to_string(),
        exp: access_exp,
        refresh: false,
    };
    let refresh_claims = Claims {
        sub: user_id.to_string(),
        exp: refresh_exp,
        refresh: true,
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    let access =
        encode(&Header::default(), &access_claims, &key).map_err(|e| AppError::Anyhow(e.into()))?;
    let refresh = encode(&Header::default(), &refresh_claims, &key)
        .map_err(|e| AppError::Anyhow(e.into()))?;

    Ok((access, refresh))
}

/// Decode and validate a JWT token.
///
/// # Errors
/// Returns Unauthorized if decoding fails.
pub fn decode_jwt(token: &str, config: &Config) -> AppResult<Claims> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let data = decode::<Claims>(token, &key, &Validation::default())
        .map_err(|_| AppError::Unauthorized)?;
    Ok(data.claims)
}

/// Build a keyed rate limiter (60 requests per minute per key).
#[must_use]
pub fn build_rate_limiter() -> Arc<KeyedRateLimiter> {
    let quota = governor::Quota::per_minute(NonZeroU32::MIN.saturating_add(59));
    Arc::new(RateLimiter::keyed(quota))
}

/// Timestamp for a mutation of a record last written at `previous`.
///
/// Always strictly later than `previous`, even when the clock has not advanced.
#[must_use]
pub fn advance_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}
