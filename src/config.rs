use anyhow::Context;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// PostgreSQL document store; the in-process store is used when unset.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_port: u16,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
}

impl Config {
    /// Load configuration from environment variables, applying defaults where appropriate.
    ///
    /// # Errors
    /// Returns an error if `JWT_SECRET` is missing or empty.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let server_port = env_or("SERVER_PORT", 8080);
        let access_token_minutes = env_or("ACCESS_TOKEN_MINUTES", 15);
        let refresh_token_days = env_or("REFRESH_TOKEN_DAYS", 7);

        Ok(Self {
            database_url,
            jwt_secret,
            server_port,
            access_token_minutes,
            refresh_token_days,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
