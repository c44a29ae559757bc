use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::{
    errors::AppError,
    store::{Document, StoredDocument},
};

/// Document field holding the owning user's id; every collection query is scoped by it.
pub const OWNER_FIELD: &str = "ownerId";

/// Reading status of a book. The only values accepted on any write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BookStatus {
    #[default]
    ToRead,
    Reading,
    Read,
}

impl BookStatus {
    pub const ALL: [BookStatus; 3] = [BookStatus::ToRead, BookStatus::Reading, BookStatus::Read];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BookStatus::ToRead => "ToRead",
            BookStatus::Reading => "Reading",
            BookStatus::Read => "Read",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "status must be one of ToRead, Reading, Read (got {s:?})"
                ))
            })
    }
}

/// Status as read back from the backend, which does not enforce the enum.
///
/// Any stored value that is not one of the three statuses (another string, a
/// number, `null`, a missing field) is kept verbatim as `Unrecognized`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordedStatus {
    Known(BookStatus),
    Unrecognized(serde_json::Value),
}

impl Default for RecordedStatus {
    fn default() -> Self {
        RecordedStatus::Unrecognized(serde_json::Value::Null)
    }
}

impl RecordedStatus {
    #[must_use]
    pub fn known(&self) -> Option<BookStatus> {
        match self {
            RecordedStatus::Known(status) => Some(*status),
            RecordedStatus::Unrecognized(_) => None,
        }
    }
}

impl From<BookStatus> for RecordedStatus {
    fn from(status: BookStatus) -> Self {
        RecordedStatus::Known(status)
    }
}

/// Persisted fields of a book document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: RecordedStatus,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub cover_url: Option<String>,
}

impl BookRecord {
    /// Encode as a backend document.
    ///
    /// # Errors
    /// Returns a serialization error if the record cannot be represented as a JSON object.
    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "book record serialized to non-object {other}"
            ))),
        }
    }
}

/// A book record together with its backend-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Book {
    pub id: String,
    #[serde(flatten)]
    pub record: BookRecord,
}

impl Book {
    /// Decode a stored document.
    ///
    /// # Errors
    /// Returns an error if required fields are missing or have the wrong shape.
    pub fn from_document(doc: StoredDocument) -> Result<Self, serde_json::Error> {
        let record = serde_json::from_value(serde_json::Value::Object(doc.fields))?;
        Ok(Self { id: doc.id, record })
    }

    #[must_use]
    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.record.owner_id == owner_id
    }
}

/// Result of a confirmed status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub id: String,
    pub status: BookStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub total: usize,
    pub read: usize,
    pub reading: usize,
    pub to_read: usize,
    /// Records whose status is not one of the three known values.
    pub other: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub user_id: String,
    pub profile: Option<UserProfile>,
    pub stats: ProfileStats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub refresh: bool,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Accept a JSON string or number; anything else reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Parse a page count typed into a form. Empty, non-numeric or negative input is absent.
#[must_use]
pub fn parse_page_count(input: Option<&str>) -> Option<u32> {
    input.and_then(|raw| raw.trim().parse::<u32>().ok())
}

/// Trim optional free-form input; blank becomes absent.
#[must_use]
pub fn normalize_optional(input: Option<String>) -> Option<String> {
    input
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(custom(function = "not_blank"))]
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Book fields as entered in the add-book form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub author: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub page_count: Option<String>,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
}

impl CreateBookRequest {
    #[must_use]
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}
