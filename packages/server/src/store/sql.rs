use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use uuid::Uuid;

use super::{CollectionStore, StoreError};
use crate::entity::collection;
use crate::models::collection::sort_by_key;
use crate::models::{Collection, Family, NaturalKey};

/// Store backed by the `collection` table; one row per aggregate.
#[derive(Clone)]
pub struct SqlCollectionStore {
    db: DatabaseConnection,
}

impl SqlCollectionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn key_taken(&self, key: &NaturalKey, except: Uuid) -> Result<bool, StoreError> {
        let existing = collection::Entity::find()
            .filter(collection::Column::Family.eq(key.family().as_str()))
            .filter(collection::Column::NaturalKey.eq(key.to_string()))
            .filter(collection::Column::Id.ne(except))
            .one(&self.db)
            .await?;
        Ok(existing.is_some())
    }
}

fn to_active(c: &Collection) -> Result<collection::ActiveModel, StoreError> {
    Ok(collection::ActiveModel {
        id: Set(c.id),
        family: Set(c.family().as_str().to_string()),
        natural_key: Set(c.key.to_string()),
        document: Set(serde_json::to_value(c)?),
        created_at: Set(c.created_at),
        updated_at: Set(c.updated_at),
    })
}

fn decode(model: collection::Model) -> Result<Collection, StoreError> {
    Ok(serde_json::from_value(model.document)?)
}

fn write_error(err: DbErr, key: &NaturalKey) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::DuplicateKey(key.clone()),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl CollectionStore for SqlCollectionStore {
    async fn insert(&self, c: &Collection) -> Result<(), StoreError> {
        if self.key_taken(&c.key, c.id).await? {
            return Err(StoreError::DuplicateKey(c.key.clone()));
        }
        collection::Entity::insert(to_active(c)?)
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| write_error(e, &c.key))?;
        Ok(())
    }

    async fn replace(&self, c: &Collection) -> Result<(), StoreError> {
        if self.key_taken(&c.key, c.id).await? {
            return Err(StoreError::DuplicateKey(c.key.clone()));
        }
        match to_active(c)?.update(&self.db).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(StoreError::NotFound(c.id)),
            Err(e) => Err(write_error(e, &c.key)),
        }
    }

    async fn remove(&self, family: Family, id: Uuid) -> Result<bool, StoreError> {
        let result = collection::Entity::delete_many()
            .filter(collection::Column::Id.eq(id))
            .filter(collection::Column::Family.eq(family.as_str()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn get(&self, family: Family, id: Uuid) -> Result<Option<Collection>, StoreError> {
        collection::Entity::find_by_id(id)
            .filter(collection::Column::Family.eq(family.as_str()))
            .one(&self.db)
            .await?
            .map(decode)
            .transpose()
    }

    async fn find_by_key(&self, key: &NaturalKey) -> Result<Option<Collection>, StoreError> {
        collection::Entity::find()
            .filter(collection::Column::Family.eq(key.family().as_str()))
            .filter(collection::Column::NaturalKey.eq(key.to_string()))
            .one(&self.db)
            .await?
            .map(decode)
            .transpose()
    }

    async fn list(&self, family: Family) -> Result<Vec<Collection>, StoreError> {
        let rows = collection::Entity::find()
            .filter(collection::Column::Family.eq(family.as_str()))
            .all(&self.db)
            .await?;
        let mut out = rows
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<_>, _>>()?;
        // Years must sort numerically, so ordering happens on decoded keys.
        sort_by_key(&mut out);
        Ok(out)
    }
}
