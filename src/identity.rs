//! Identity provider: account creation and credential checks.

use std::sync::Arc;

use anyhow::anyhow;
use argon2::password_hash::rand_core::OsRng;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    errors::{AppError, AppResult, BackendError},
    store::{Collection, Document, DocumentStore, Filter},
};

/// Issues stable user ids and checks credentials.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an account and returns the new user id.
    async fn create_account(&self, email: &str, password: &str) -> AppResult<String>;

    /// Returns the user id owning these credentials, or `InvalidCredentials`.
    async fn verify_credentials(&self, email: &str, password: &str) -> AppResult<String>;

    /// Removes an account, used to roll back a registration whose profile write failed.
    async fn delete_account(&self, user_id: &str) -> AppResult<()>;
}

/// Hash a plaintext password using Argon2.
///
/// # Errors
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Anyhow(anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

/// Verify a plaintext password against a stored hash.
///
/// # Errors
/// Returns an error if the hash format is invalid.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Anyhow(anyhow!(e.to_string())))?;
    let argon2 = Argon2::default();
    Ok(argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Identity provider keeping argon2 credential records in the `accounts` collection.
///
/// Registrations are serialized so the email uniqueness check and the account
/// write cannot interleave within one process.
pub struct StoreIdentityProvider {
    store: Arc<dyn DocumentStore>,
    registration: Mutex<()>,
}

impl StoreIdentityProvider {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            registration: Mutex::new(()),
        }
    }
}

#[async_trait]
impl IdentityProvider for StoreIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> AppResult<String> {
        let email = normalize_email(email);
        let password_hash = hash_password(password)?;

        let _guard = self.registration.lock().await;
        let existing = self
            .store
            .query(Collection::Accounts, &Filter::eq("email", email.as_str()))
            .await?;
        if !existing.is_empty() {
            return Err(AppError::Validation("email is already registered".into()));
        }

        let mut fields = Document::new();
        fields.insert("email".into(), json!(email));
        fields.insert("passwordHash".into(), json!(password_hash));
        fields.insert("createdAt".into(), json!(Utc::now()));

        let user_id = match self.store.create(Collection::Accounts, fields).await {
            Ok(id) => id,
            Err(BackendError::Conflict(_)) => {
                return Err(AppError::Validation("email is already registered".into()));
            }
            Err(e) => return Err(e.into()),
        };
        info!(%user_id, "account created");
        Ok(user_id)
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> AppResult<String> {
        let email = normalize_email(email);
        let account = self
            .store
            .query(Collection::Accounts, &Filter::eq("email", email.as_str()))
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::InvalidCredentials)?;

        let Some(hash) = account.fields.get("passwordHash").and_then(|v| v.as_str()) else {
            warn!(user_id = %account.id, "account record has no password hash");
            return Err(AppError::InvalidCredentials);
        };
        if !verify_password(password, hash)? {
            return Err(AppError::InvalidCredentials);
        }
        Ok(account.id)
    }

    async fn delete_account(&self, user_id: &str) -> AppResult<()> {
        self.store.delete(Collection::Accounts, user_id).await?;
        info!(%user_id, "account deleted");
        Ok(())
    }
}
