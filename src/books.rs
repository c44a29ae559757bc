//! Book lifecycle: validated create, status update and delete of a single record.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{error, info};
use validator::Validate;

use crate::{
    errors::{AppError, AppResult, BackendError},
    models::{
        Book, BookRecord, BookStatus, CreateBookRequest, OWNER_FIELD, StatusUpdate,
        normalize_optional, parse_page_count,
    },
    session::Session,
    store::{Collection, Document, DocumentStore, StoredDocument},
    utils::advance_timestamp,
};

/// Executes the mutating operations on book records.
///
/// Validation always completes before the first backend call; every backend
/// call is attempted exactly once.
#[derive(Clone)]
pub struct BookLifecycle {
    store: Arc<dyn DocumentStore>,
}

impl BookLifecycle {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a book owned by the session's user.
    ///
    /// # Errors
    /// Returns `Validation` for a blank title/author or an unknown status (no write is
    /// attempted), or a backend error if the write fails.
    pub async fn create(&self, session: &Session, request: CreateBookRequest) -> AppResult<Book> {
        request.validate()?;
        let status = match request.status.as_deref().map(str::trim) {
            None | Some("") => BookStatus::default(),
            Some(raw) => raw.parse()?,
        };

        let now = Utc::now();
        let record = BookRecord {
            title: request.title.trim().to_string(),
            author: request.author.trim().to_string(),
            publisher: normalize_optional(request.publisher),
            page_count: parse_page_count(request.page_count.as_deref()),
            publish_date: normalize_optional(request.publish_date),
            isbn: normalize_optional(request.isbn),
            notes: normalize_optional(request.notes),
            status: status.into(),
            owner_id: session.user_id().to_string(),
            created_at: now,
            updated_at: now,
            cover_url: normalize_optional(request.cover_url),
        };
        let fields = record.to_document().map_err(BackendError::from)?;

        let id = self
            .store
            .create(Collection::Books, fields)
            .await
            .inspect_err(|e| error!(owner = %session.user_id(), "failed to create book: {e}"))?;

        info!(book_id = %id, owner = %session.user_id(), %status, "book created");
        Ok(Book { id, record })
    }

    /// Load one of the session's books.
    ///
    /// # Errors
    /// Returns `NotFound` if the record does not exist or belongs to someone else.
    pub async fn get(&self, session: &Session, book_id: &str) -> AppResult<Book> {
        let fields = self
            .store
            .get(Collection::Books, book_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let book = Book::from_document(StoredDocument {
            id: book_id.to_string(),
            fields,
        })
        .map_err(BackendError::from)?;

        if !book.is_owned_by(session.user_id()) {
            return Err(AppError::NotFound);
        }
        Ok(book)
    }

    /// Raw document of one of the session's books, for mutations.
    ///
    /// Only existence and `ownerId` are checked, so a record with fields that no
    /// longer decode can still be re-statused or deleted by its owner.
    async fn owned_document(&self, session: &Session, book_id: &str) -> AppResult<Document> {
        let fields = self
            .store
            .get(Collection::Books, book_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let owner = fields.get(OWNER_FIELD).and_then(|v| v.as_str());
        if owner != Some(session.user_id()) {
            return Err(AppError::NotFound);
        }
        Ok(fields)
    }

    /// Rewrite a book's status and `updatedAt`; all other fields stay untouched.
    ///
    /// `new_status` is raw caller input and must name one of the three statuses.
    ///
    /// # Errors
    /// Returns `Validation` for any other value (no backend call is made), `NotFound` if
    /// the book is gone, or a backend error.
    pub async fn update_status(
        &self,
        session: &Session,
        book_id: &str,
        new_status: &str,
    ) -> AppResult<StatusUpdate> {
        let status: BookStatus = new_status.parse()?;
        let fields = self.owned_document(session, book_id).await?;
        let previous = fields
            .get("updatedAt")
            .and_then(|v| serde_json::from_value::<DateTime<Utc>>(v.clone()).ok());
        let updated_at = previous.map_or_else(Utc::now, advance_timestamp);

        let mut partial = Document::new();
        partial.insert("status".into(), json!(status));
        partial.insert("updatedAt".into(), json!(updated_at));

        self.store
            .update(Collection::Books, book_id, partial)
            .await
            .inspect_err(|e| error!(%book_id, "failed to update book status: {e}"))?;

        info!(%book_id, owner = %session.user_id(), %status, "book status updated");
        Ok(StatusUpdate {
            id: book_id.to_string(),
            status,
            updated_at,
        })
    }

    /// Permanently remove a book. Irreversible; callers confirm with the user first.
    ///
    /// # Errors
    /// Returns `NotFound` if the book is gone or not owned by the session, or a backend error.
    pub async fn delete(&self, session: &Session, book_id: &str) -> AppResult<()> {
        self.owned_document(session, book_id).await?;
        self.store
            .delete(Collection::Books, book_id)
            .await
            .inspect_err(|e| error!(%book_id, "failed to delete book: {e}"))?;
        info!(%book_id, owner = %session.user_id(), "book deleted");
        Ok(())
    }
}
