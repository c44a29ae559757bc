//! The signed-in user's book collection.

use tracing::warn;

use crate::{
    errors::AppResult,
    models::{Book, OWNER_FIELD, ProfileStats, StatusUpdate},
    profile::compute_stats,
    session::Session,
    store::{Collection, DocumentStore, Filter},
};

/// Load every book owned by the session's user, in backend order.
///
/// Documents that cannot be decoded, or that name a different owner, are
/// skipped with a warning rather than failing the whole listing.
///
/// # Errors
/// Returns a backend error if the query fails. Zero books is an empty list.
pub async fn load_all(store: &dyn DocumentStore, session: &Session) -> AppResult<Vec<Book>> {
    let docs = store
        .query(Collection::Books, &Filter::eq(OWNER_FIELD, session.user_id()))
        .await?;

    let mut books = Vec::with_capacity(docs.len());
    for doc in docs {
        let id = doc.id.clone();
        match Book::from_document(doc) {
            Ok(book) if book.is_owned_by(session.user_id()) => books.push(book),
            Ok(_) => warn!(book_id = %id, "query returned a book owned by another user"),
            Err(e) => warn!(book_id = %id, "skipping malformed book document: {e}"),
        }
    }
    Ok(books)
}

/// Per-screen cached copy of the collection.
///
/// Reloaded whenever the screen becomes visible; between reloads it may be
/// stale. Mutations are applied only after the backend confirmed them.
#[derive(Debug, Default)]
pub struct CollectionView {
    books: Vec<Book>,
}

impl CollectionView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Reload from the backend. On failure the previous contents are kept and
    /// `false` is returned.
    pub async fn refresh(&mut self, store: &dyn DocumentStore, session: &Session) -> bool {
        match load_all(store, session).await {
            Ok(books) => {
                self.books = books;
                true
            }
            Err(e) => {
                warn!(owner = %session.user_id(), "collection refresh failed, keeping stale view: {e}");
                false
            }
        }
    }

    /// Replace (or add) the cached copy of a confirmed record.
    pub fn apply(&mut self, book: Book) {
        match self.books.iter_mut().find(|b| b.id == book.id) {
            Some(slot) => *slot = book,
            None => self.books.push(book),
        }
    }

    /// Record a confirmed status change on the cached copy, if present.
    pub fn apply_status(&mut self, update: &StatusUpdate) {
        if let Some(book) = self.books.iter_mut().find(|b| b.id == update.id) {
            book.record.status = update.status.into();
            book.record.updated_at = update.updated_at;
        }
    }

    pub fn remove(&mut self, book_id: &str) -> Option<Book> {
        let idx = self.books.iter().position(|b| b.id == book_id)?;
        Some(self.books.remove(idx))
    }

    #[must_use]
    pub fn stats(&self) -> ProfileStats {
        compute_stats(&self.books)
    }
}
