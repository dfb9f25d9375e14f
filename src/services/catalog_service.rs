//! CatalogService — entry point for owner records, media associations and
//! the visibility lifecycle, backed by SQLite.
//!
//! The media operations live in `image_service` (single owner) and
//! `batch_image_service` (many owners); lifecycle transitions live in
//! `visibility_service`. This file holds the shared state and the plain owner
//! record operations.

use crate::{
    models::owner::{NewOwner, Owner, OwnerWithMedia},
    services::{
        error::{CatalogError, CatalogResult},
        owner_adapter::{FieldSelector, FieldUpdate, FieldValue},
        registry::OwnerRegistry,
        validation::{ensure_batch_size, ensure_description, ensure_owner_id, ensure_owner_name},
    },
};
use sqlx::SqlitePool;
use std::{collections::HashSet, sync::Arc};
use tracing::info;
use uuid::Uuid;

/// Stateless service handle. Cloning shares the pool and registry.
///
/// Every public operation runs in exactly one transaction. Dropping an
/// operation's future before it commits rolls that transaction back.
#[derive(Clone, Debug)]
pub struct CatalogService {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,

    /// Owner-type routing table.
    pub registry: OwnerRegistry,
}

impl CatalogService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self {
            db,
            registry: OwnerRegistry::new(),
        }
    }

    /// Create an owner record of the given kind with a fresh id and no media.
    pub async fn create_owner(&self, owner_type: &str, new: NewOwner) -> CatalogResult<Owner> {
        ensure_owner_name(&new.name)?;
        if let Some(text) = &new.short_description {
            ensure_description(text)?;
        }
        let adapter = self.registry.resolve(owner_type)?;

        let id = Uuid::new_v4().to_string();
        let mut tx = self.db.begin().await?;
        let owner = adapter.bind(&mut *tx).insert_owner(&id, &new).await?;
        tx.commit().await?;

        info!(kind = %adapter.kind(), id = %owner.id, published = owner.published, "owner created");
        Ok(owner)
    }

    /// Fetch an owner, published or not, together with its attached media.
    pub async fn get_owner(&self, owner_type: &str, owner_id: &str) -> CatalogResult<OwnerWithMedia> {
        ensure_owner_id(owner_id)?;
        let adapter = self.registry.resolve(owner_type)?;

        let mut tx = self.db.begin().await?;
        let mut repo = adapter.bind(&mut *tx);
        let owner = repo.fetch_including_unpublished(owner_id).await?;
        let media = repo.list_media(&owner.id).await?;
        tx.commit().await?;

        Ok(OwnerWithMedia { owner, media })
    }

    /// Apply per-owner name or description edits in one statement.
    ///
    /// Counters are owned by the image operations and cannot be set here.
    /// Returns the number of rows written; unknown ids are not errors.
    pub async fn update_owner_fields(
        &self,
        owner_type: &str,
        updates: Vec<FieldUpdate>,
    ) -> CatalogResult<u64> {
        let distinct: HashSet<&str> = updates.iter().map(|u| u.owner_id.as_str()).collect();
        ensure_batch_size(distinct.len())?;
        for update in &updates {
            ensure_owner_id(&update.owner_id)?;
            match &update.value {
                FieldValue::Name(name) => ensure_owner_name(name)?,
                FieldValue::ShortDescription(Some(text)) => ensure_description(text)?,
                FieldValue::ShortDescription(None) => {}
                FieldValue::UploadedCount { .. } => {
                    return Err(CatalogError::InvalidArgument(format!(
                        "`{}` is maintained by image operations",
                        FieldSelector::UploadedCount.as_str()
                    )));
                }
            }
        }
        let adapter = self.registry.resolve(owner_type)?;

        let mut tx = self.db.begin().await?;
        let written = adapter.bind(&mut *tx).batch_set_field(&updates).await?;
        tx.commit().await?;

        info!(kind = %adapter.kind(), requested = updates.len(), written, "owner fields updated");
        Ok(written)
    }
}
