//! Hierarchical collection store.
//!
//! A [`Collection`] together with its entries and attachments is one storage
//! unit: every write reads, mutates and persists the whole aggregate. There is
//! no cross-aggregate transaction and no optimistic concurrency token, so two
//! racing writes to the same aggregate resolve last-write-wins.

pub mod memory;
pub mod sql;

use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Collection, Family, NaturalKey};

pub use memory::MemoryCollectionStore;
pub use sql::SqlCollectionStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a collection with key {0} already exists")]
    DuplicateKey(NaturalKey),

    #[error("collection {0} does not exist")]
    NotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("document codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Persist a new aggregate. Fails with `DuplicateKey` when another
    /// collection of the same family already holds its key.
    async fn insert(&self, collection: &Collection) -> Result<(), StoreError>;

    /// Overwrite an existing aggregate, including a possibly renamed key.
    async fn replace(&self, collection: &Collection) -> Result<(), StoreError>;

    /// Remove an aggregate. Returns whether it existed.
    async fn remove(&self, family: Family, id: Uuid) -> Result<bool, StoreError>;

    async fn get(&self, family: Family, id: Uuid) -> Result<Option<Collection>, StoreError>;

    async fn find_by_key(&self, key: &NaturalKey) -> Result<Option<Collection>, StoreError>;

    /// Every collection of a family, sorted by natural key ascending.
    async fn list(&self, family: Family) -> Result<Vec<Collection>, StoreError>;
}
