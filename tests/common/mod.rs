#![allow(dead_code)]

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use reading_list_api::{
    BackendError,
    store::{Collection, Document, DocumentStore, Filter, MemoryStore, StoredDocument},
};

/// Wraps a `MemoryStore`, counting calls and optionally failing them.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    calls: AtomicUsize,
    writes: AtomicUsize,
    offline: AtomicBool,
    rejected_writes: Mutex<Option<Collection>>,
    concurrent_delete: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fail every write to `collection` with a permission error.
    pub fn reject_writes_to(&self, collection: Option<Collection>) {
        *self.rejected_writes.lock().unwrap() = collection;
    }

    /// After each successful `get`, delete the document as another device would.
    pub fn delete_after_read(&self, enabled: bool) {
        self.concurrent_delete.store(enabled, Ordering::SeqCst);
    }

    fn enter(&self, write: Option<Collection>) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(collection) = write {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if *self.rejected_writes.lock().unwrap() == Some(collection) {
                return Err(BackendError::PermissionDenied(format!(
                    "writes to {} are rejected",
                    collection.as_str()
                )));
            }
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("network unreachable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn create(&self, collection: Collection, fields: Document) -> Result<String, BackendError> {
        self.enter(Some(collection))?;
        self.inner.create(collection, fields).await
    }

    async fn set(&self, collection: Collection, id: &str, fields: Document) -> Result<(), BackendError> {
        self.enter(Some(collection))?;
        self.inner.set(collection, id, fields).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, BackendError> {
        self.enter(None)?;
        let found = self.inner.get(collection, id).await?;
        if found.is_some() && self.concurrent_delete.load(Ordering::SeqCst) {
            self.inner.delete(collection, id).await?;
        }
        Ok(found)
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, BackendError> {
        self.enter(None)?;
        self.inner.query(collection, filter).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        partial: Document,
    ) -> Result<(), BackendError> {
        self.enter(Some(collection))?;
        self.inner.update(collection, id, partial).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), BackendError> {
        self.enter(Some(collection))?;
        self.inner.delete(collection, id).await
    }
}
