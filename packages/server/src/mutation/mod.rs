//! Validated create/update/delete of collections and entries, keeping blob
//! storage consistent with document state.
//!
//! Ordering for every write:
//! 1. all input validation (nothing touched yet)
//! 2. upload new blobs (this request's uploads are purged if anything below fails)
//! 3. persist the aggregate
//! 4. best-effort delete of superseded blobs
//! 5. publish the family snapshot
//!
//! Deletes attempt removal of every owned blob before the document write and
//! never abort on a failed blob delete.

use std::sync::Arc;

use common::storage::BlobStore;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::broadcast::Broadcaster;
use crate::error::AppError;
use crate::models::entry::{AttachmentChange, AttachmentKind, EntryForm, PlacedFile};
use crate::models::{Collection, CollectionRequest, Entry, Family, Infographic, Media};
use crate::store::{CollectionStore, StoreError};

pub struct MutationService {
    store: Arc<dyn CollectionStore>,
    blobs: Arc<dyn BlobStore>,
    broadcaster: Arc<Broadcaster>,
}

/// Attachments uploaded by a single request.
#[derive(Default)]
struct Uploaded {
    media: Option<Vec<Media>>,
    infographics: Option<Vec<Infographic>>,
}

impl Uploaded {
    fn urls(&self) -> Vec<String> {
        let media = self.media.iter().flatten().map(|m| m.url.clone());
        let infographics = self.infographics.iter().flatten().map(|i| i.url.clone());
        media.chain(infographics).collect()
    }
}

impl MutationService {
    pub fn new(
        store: Arc<dyn CollectionStore>,
        blobs: Arc<dyn BlobStore>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            store,
            blobs,
            broadcaster,
        }
    }

    #[instrument(skip(self, request), fields(%family))]
    pub async fn create_collection(
        &self,
        family: Family,
        request: CollectionRequest,
    ) -> Result<Collection, AppError> {
        let (Some(key), Some(x), Some(y)) =
            (request.key(family), request.x_position, request.y_position)
        else {
            return Err(AppError::Validation(family.required_message().into()));
        };
        let key = family.key_from_value(key)?;

        if self.store.find_by_key(&key).await?.is_some() {
            return Err(family.duplicate(&key));
        }

        let collection = Collection::new(key, x, y);
        self.store.insert(&collection).await?;
        info!(id = %collection.id, key = %collection.key, "Created collection");

        self.broadcaster.publish_snapshot(family).await;
        Ok(collection)
    }

    #[instrument(skip(self, request), fields(%family, %id))]
    pub async fn update_collection(
        &self,
        family: Family,
        id: Uuid,
        request: CollectionRequest,
    ) -> Result<Collection, AppError> {
        let mut collection = self.load(family, id).await?;

        if let Some(value) = request.key(family) {
            collection.key = family.key_from_value(value)?;
        }
        if let Some(x) = request.x_position {
            collection.x_position = x;
        }
        if let Some(y) = request.y_position {
            collection.y_position = y;
        }
        collection.touch();

        self.persist(&collection).await?;
        info!(key = %collection.key, "Updated collection");

        self.broadcaster.publish_snapshot(family).await;
        Ok(collection)
    }

    #[instrument(skip(self), fields(%family, %id))]
    pub async fn delete_collection(&self, family: Family, id: Uuid) -> Result<(), AppError> {
        let collection = self.load(family, id).await?;

        self.purge(&collection.blob_urls()).await;

        if !self.store.remove(family, id).await? {
            return Err(family.not_found());
        }
        info!(key = %collection.key, "Deleted collection");

        self.broadcaster.publish_snapshot(family).await;
        Ok(())
    }

    #[instrument(skip(self, form), fields(%family, %id))]
    pub async fn add_entry(
        &self,
        family: Family,
        id: Uuid,
        form: EntryForm,
    ) -> Result<Collection, AppError> {
        let mut collection = self.load(family, id).await?;

        form.media.check_against(AttachmentKind::Media, 0)?;
        form.infographics
            .check_against(AttachmentKind::Infographic, 0)?;

        let uploaded = self.upload(&form).await?;
        let entry = Entry {
            id: Uuid::new_v4(),
            title: form.title.unwrap_or_default(),
            description: form.description.unwrap_or_default(),
            x_position: form.x_position.unwrap_or(0.0),
            y_position: form.y_position.unwrap_or(0.0),
            media: uploaded.media.clone().unwrap_or_default(),
            infographics: uploaded.infographics.clone().unwrap_or_default(),
        };
        let entry_id = entry.id;
        collection.entries.push(entry);
        collection.touch();

        if let Err(e) = self.persist(&collection).await {
            self.purge(&uploaded.urls()).await;
            return Err(e);
        }
        info!(%entry_id, "Added entry");

        self.broadcaster.publish_snapshot(family).await;
        Ok(collection)
    }

    #[instrument(skip(self, form), fields(%family, %id, %entry_id))]
    pub async fn update_entry(
        &self,
        family: Family,
        id: Uuid,
        entry_id: Uuid,
        form: EntryForm,
    ) -> Result<Collection, AppError> {
        let mut collection = self.load(family, id).await?;
        let entry = collection
            .entry_mut(entry_id)
            .ok_or_else(|| AppError::NotFound("Entry not found.".into()))?;

        form.media
            .check_against(AttachmentKind::Media, entry.media.len())?;
        form.infographics
            .check_against(AttachmentKind::Infographic, entry.infographics.len())?;

        let uploaded = self.upload(&form).await?;
        let superseded = apply_entry_form(entry, form, &uploaded);
        collection.touch();

        if let Err(e) = self.persist(&collection).await {
            self.purge(&uploaded.urls()).await;
            return Err(e);
        }
        info!(replaced = superseded.len(), "Updated entry");

        self.purge(&superseded).await;
        self.broadcaster.publish_snapshot(family).await;
        Ok(collection)
    }

    #[instrument(skip(self), fields(%family, %id, %entry_id))]
    pub async fn delete_entry(
        &self,
        family: Family,
        id: Uuid,
        entry_id: Uuid,
    ) -> Result<Collection, AppError> {
        let mut collection = self.load(family, id).await?;
        let entry = collection
            .remove_entry(entry_id)
            .ok_or_else(|| AppError::NotFound("Entry not found.".into()))?;
        collection.touch();

        let owned: Vec<String> = entry.blob_urls().map(str::to_string).collect();
        self.purge(&owned).await;

        self.persist(&collection).await?;
        info!("Deleted entry");

        self.broadcaster.publish_snapshot(family).await;
        Ok(collection)
    }

    async fn load(&self, family: Family, id: Uuid) -> Result<Collection, AppError> {
        self.store
            .get(family, id)
            .await?
            .ok_or_else(|| family.not_found())
    }

    async fn persist(&self, collection: &Collection) -> Result<(), AppError> {
        match self.store.replace(collection).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound(_)) => Err(collection.family().not_found()),
            Err(e) => Err(e.into()),
        }
    }

    /// Upload every new file of the form. On failure, whatever this call
    /// already uploaded is purged before the error is returned.
    async fn upload(&self, form: &EntryForm) -> Result<Uploaded, AppError> {
        let mut uploaded = Uploaded::default();
        if form.upload_count() == 0 {
            return Ok(uploaded);
        }

        let mut done: Vec<String> = Vec::new();
        let result = self.upload_all(form, &mut uploaded, &mut done).await;
        if let Err(e) = result {
            self.purge(&done).await;
            return Err(e);
        }
        debug!(count = done.len(), "Uploaded attachments");
        Ok(uploaded)
    }

    async fn upload_all(
        &self,
        form: &EntryForm,
        uploaded: &mut Uploaded,
        done: &mut Vec<String>,
    ) -> Result<(), AppError> {
        if let AttachmentChange::Replace(files) = &form.media {
            let mut media = Vec::with_capacity(files.len());
            for placed in files {
                let stored = self.store_file(placed, AttachmentKind::Media, done).await?;
                media.push(Media {
                    url: stored.url,
                    media_type: stored.kind,
                    x_position: placed.x,
                    y_position: placed.y,
                });
            }
            uploaded.media = Some(media);
        }

        if let AttachmentChange::Replace(files) = &form.infographics {
            let mut infographics = Vec::with_capacity(files.len());
            for placed in files {
                let stored = self
                    .store_file(placed, AttachmentKind::Infographic, done)
                    .await?;
                infographics.push(Infographic {
                    url: stored.url,
                    x_position: Some(placed.x),
                    y_position: Some(placed.y),
                });
            }
            uploaded.infographics = Some(infographics);
        }

        Ok(())
    }

    async fn store_file(
        &self,
        placed: &PlacedFile,
        kind: AttachmentKind,
        done: &mut Vec<String>,
    ) -> Result<common::storage::StoredBlob, AppError> {
        let stored = self
            .blobs
            .upload(&placed.file.bytes, &placed.file.content_type, kind.category())
            .await?;
        done.push(stored.url.clone());
        Ok(stored)
    }

    /// Best-effort blob removal. Every URL is attempted; failures are logged.
    async fn purge(&self, urls: &[String]) {
        for url in urls {
            match self.blobs.delete(url).await {
                Ok(true) => debug!(%url, "Deleted blob"),
                Ok(false) => debug!(%url, "Blob already absent"),
                Err(e) => warn!(%url, error = %e, "Failed to delete blob; leaving it orphaned"),
            }
        }
    }
}

/// Apply a validated form to an entry. Returns URLs of attachments that were
/// replaced and should now be deleted.
fn apply_entry_form(entry: &mut Entry, form: EntryForm, uploaded: &Uploaded) -> Vec<String> {
    if let Some(title) = form.title.filter(|t| !t.is_empty()) {
        entry.title = title;
    }
    if let Some(description) = form.description {
        entry.description = description;
    }
    if let Some(x) = form.x_position {
        entry.x_position = x;
    }
    if let Some(y) = form.y_position {
        entry.y_position = y;
    }

    let mut superseded = Vec::new();

    match (&form.media, &uploaded.media) {
        (AttachmentChange::Reposition(positions), _) => {
            for (media, &(x, y)) in entry.media.iter_mut().zip(positions) {
                media.x_position = x;
                media.y_position = y;
            }
        }
        (AttachmentChange::Replace(_), Some(new)) => {
            let old = std::mem::replace(&mut entry.media, new.clone());
            superseded.extend(old.into_iter().map(|m| m.url));
        }
        _ => {}
    }

    match (&form.infographics, &uploaded.infographics) {
        (AttachmentChange::Reposition(positions), _) => {
            for (info, &(x, y)) in entry.infographics.iter_mut().zip(positions) {
                info.x_position = Some(x);
                info.y_position = Some(y);
            }
        }
        (AttachmentChange::Replace(_), Some(new)) => {
            let old = std::mem::replace(&mut entry.infographics, new.clone());
            superseded.extend(old.into_iter().map(|i| i.url));
        }
        _ => {}
    }

    superseded
}
