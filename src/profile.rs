//! Registration, profile lookup and reading statistics.

use chrono::Utc;
use tracing::{error, info, warn};
use validator::Validate;

use crate::{
    collection::load_all,
    errors::{AppError, AppResult, BackendError},
    identity::IdentityProvider,
    models::{Book, BookStatus, ProfileStats, ProfileSummary, RecordedStatus, RegisterRequest, UserProfile},
    session::Session,
    store::{Collection, DocumentStore},
};

/// Count books per status. Unrecognized statuses land in `other`.
#[must_use]
pub fn compute_stats(books: &[Book]) -> ProfileStats {
    books.iter().fold(ProfileStats::default(), |mut stats, book| {
        stats.total += 1;
        match &book.record.status {
            RecordedStatus::Known(BookStatus::Read) => stats.read += 1,
            RecordedStatus::Known(BookStatus::Reading) => stats.reading += 1,
            RecordedStatus::Known(BookStatus::ToRead) => stats.to_read += 1,
            RecordedStatus::Unrecognized(_) => stats.other += 1,
        }
        stats
    })
}

/// Create an account and its `users` profile document.
///
/// # Errors
/// Returns `Validation` for missing fields, a malformed email, a short password or a
/// confirmation mismatch (before any backend call), or an identity/backend error.
/// If the profile write fails the new account is deleted again, so the email
/// stays free for a retry.
pub async fn register(
    identity: &dyn IdentityProvider,
    store: &dyn DocumentStore,
    request: RegisterRequest,
) -> AppResult<(Session, UserProfile)> {
    request.validate()?;
    if request.password != request.confirm_password {
        return Err(AppError::Validation("passwords do not match".into()));
    }

    let profile = UserProfile {
        name: request.name.trim().to_string(),
        email: request.email.trim().to_lowercase(),
        created_at: Utc::now(),
    };
    let fields = match serde_json::to_value(&profile).map_err(BackendError::from)? {
        serde_json::Value::Object(map) => map,
        _ => return Err(AppError::Anyhow(anyhow::anyhow!("profile did not encode as an object"))),
    };

    let user_id = identity
        .create_account(&request.email, &request.password)
        .await?;
    if let Err(e) = store.set(Collection::Users, &user_id, fields).await {
        error!(%user_id, "failed to write profile, rolling back account: {e}");
        if let Err(rollback) = identity.delete_account(&user_id).await {
            error!(%user_id, "account rollback failed: {rollback}");
        }
        return Err(e.into());
    }

    info!(%user_id, "user registered");
    Ok((Session::new(user_id), profile))
}

/// Load the `users` document for the session. A missing document is not an error.
///
/// # Errors
/// Returns a backend error if the lookup fails.
pub async fn load_user_profile(
    store: &dyn DocumentStore,
    session: &Session,
) -> AppResult<Option<UserProfile>> {
    let Some(fields) = store.get(Collection::Users, session.user_id()).await? else {
        return Ok(None);
    };
    match serde_json::from_value(serde_json::Value::Object(fields)) {
        Ok(profile) => Ok(Some(profile)),
        Err(e) => {
            warn!(user_id = %session.user_id(), "malformed profile document: {e}");
            Ok(None)
        }
    }
}

/// Profile document plus statistics over the session's books.
///
/// # Errors
/// Returns a backend error if either lookup fails.
pub async fn load_profile(store: &dyn DocumentStore, session: &Session) -> AppResult<ProfileSummary> {
    let profile = load_user_profile(store, session).await?;
    let books = load_all(store, session).await?;
    Ok(ProfileSummary {
        user_id: session.user_id().to_string(),
        profile,
        stats: compute_stats(&books),
    })
}
