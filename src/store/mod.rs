//! Document-store contract of the backend collaborator.
//!
//! The core never talks to a concrete database. Everything goes through
//! [`DocumentStore`], which models a schemaless document database with named
//! collections, backend-assigned ids and field-equality queries.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::BackendError;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

/// Field set of a single document.
pub type Document = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Books,
    /// Credential records owned by the identity provider.
    Accounts,
}

impl Collection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Books => "books",
            Collection::Accounts => "accounts",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

/// Comparison applied by a [`Filter`]. Owner scoping only needs equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
}

#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        match (self.op, doc.get(&self.field)) {
            (FilterOp::Eq, Some(v)) => *v == self.value,
            (FilterOp::Eq, None) => false,
        }
    }
}

/// CRUD contract every backend adapter implements.
///
/// Each call is a single round trip; adapters never retry.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Appends a document and returns its assigned id.
    async fn create(&self, collection: Collection, fields: Document) -> Result<String, BackendError>;

    /// Creates or replaces the document stored under `id`.
    async fn set(&self, collection: Collection, id: &str, fields: Document) -> Result<(), BackendError>;

    /// - `Ok(Some(doc))`: found
    /// - `Ok(None)`: no document with that id
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, BackendError>;

    /// All documents of `collection` matching `filter`, in backend order.
    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, BackendError>;

    /// Merges `partial` into an existing document.
    ///
    /// Fails with [`BackendError::NotFound`] if the document does not exist.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        partial: Document,
    ) -> Result<(), BackendError>;

    /// Permanently removes a document.
    ///
    /// Fails with [`BackendError::NotFound`] if the document does not exist.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), BackendError>;
}
