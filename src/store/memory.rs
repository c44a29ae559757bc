use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Collection, Document, DocumentStore, Filter, StoredDocument};
use crate::errors::BackendError;

/// In-process document store. Used when no database is configured, and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: Collection, fields: Document) -> Result<String, BackendError> {
        let id = Uuid::new_v4().simple().to_string();
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn set(&self, collection: Collection, id: &str, fields: Document) -> Result<(), BackendError> {
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, BackendError> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, BackendError> {
        let guard = self.collections.read().await;
        let Some(docs) = guard.get(&collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(_, fields)| filter.matches(fields))
            .map(|(id, fields)| StoredDocument {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        partial: Document,
    ) -> Result<(), BackendError> {
        let mut guard = self.collections.write().await;
        let doc = guard
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| BackendError::not_found(collection.as_str(), id))?;
        doc.extend(partial);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), BackendError> {
        self.collections
            .write()
            .await
            .get_mut(&collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| BackendError::not_found(collection.as_str(), id))
    }
}
