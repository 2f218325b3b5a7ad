use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CollectionStore, StoreError};
use crate::models::collection::sort_by_key;
use crate::models::{Collection, Family, NaturalKey};

/// Process-local store used for tests and database-less runs.
#[derive(Default)]
pub struct MemoryCollectionStore {
    rows: RwLock<HashMap<Uuid, Collection>>,
}

impl MemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key_taken(rows: &HashMap<Uuid, Collection>, key: &NaturalKey, except: Uuid) -> bool {
    rows.values().any(|c| c.id != except && &c.key == key)
}

#[async_trait]
impl CollectionStore for MemoryCollectionStore {
    async fn insert(&self, collection: &Collection) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        if key_taken(&rows, &collection.key, collection.id) {
            return Err(StoreError::DuplicateKey(collection.key.clone()));
        }
        rows.insert(collection.id, collection.clone());
        Ok(())
    }

    async fn replace(&self, collection: &Collection) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&collection.id) {
            return Err(StoreError::NotFound(collection.id));
        }
        if key_taken(&rows, &collection.key, collection.id) {
            return Err(StoreError::DuplicateKey(collection.key.clone()));
        }
        rows.insert(collection.id, collection.clone());
        Ok(())
    }

    async fn remove(&self, family: Family, id: Uuid) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().await;
        match rows.get(&id) {
            Some(c) if c.family() == family => Ok(rows.remove(&id).is_some()),
            _ => Ok(false),
        }
    }

    async fn get(&self, family: Family, id: Uuid) -> Result<Option<Collection>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.get(&id).filter(|c| c.family() == family).cloned())
    }

    async fn find_by_key(&self, key: &NaturalKey) -> Result<Option<Collection>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.values().find(|c| &c.key == key).cloned())
    }

    async fn list(&self, family: Family) -> Result<Vec<Collection>, StoreError> {
        let rows = self.rows.read().await;
        let mut out: Vec<Collection> = rows
            .values()
            .filter(|c| c.family() == family)
            .cloned()
            .collect();
        sort_by_key(&mut out);
        Ok(out)
    }
}
