//! Attach or detach one media asset across many owners of one kind.
//!
//! Batch add filters before writing: owners at the limit or already holding
//! the asset are left out, and only the remaining owners enter the
//! transaction. Once inside, the writes are all-or-nothing.

use crate::{
    models::{media::NewMediaAsset, owner::MAX_IMAGES_PER_OWNER},
    services::{
        catalog_service::CatalogService,
        error::{CatalogError, CatalogResult},
        owner_adapter::FieldUpdate,
        validation::{ensure_asset, ensure_media_service_id, normalize_owner_ids},
    },
};
use std::collections::HashSet;
use tracing::{debug, info, warn};

impl CatalogService {
    /// Attach `asset` to every eligible owner in `owner_ids`.
    ///
    /// Unknown ids are dropped; `OwnersNotFound` only when none remain.
    /// Returns the number of owners that gained the asset, which is zero
    /// (without opening a transaction) when every owner is ineligible.
    pub async fn add_image_batch(
        &self,
        owner_type: &str,
        owner_ids: &[String],
        asset: &NewMediaAsset,
    ) -> CatalogResult<usize> {
        ensure_asset(asset)?;
        let ids = normalize_owner_ids(owner_ids)?;
        let adapter = self.registry.resolve(owner_type)?;
        let kind = adapter.kind();

        let eligible = {
            let mut conn = self.db.acquire().await?;
            let mut repo = adapter.bind(&mut *conn);

            let owners = repo.list_including_unpublished(&ids).await?;
            if owners.is_empty() {
                return Err(CatalogError::OwnersNotFound(kind));
            }

            let listed: Vec<String> = owners.iter().map(|o| o.id.clone()).collect();
            let attached: HashSet<String> = repo
                .find_associated_owner_ids(&asset.media_service_id, &listed)
                .await?
                .into_iter()
                .collect();

            let listed_count = owners.len();
            let eligible: Vec<_> = owners
                .into_iter()
                .filter(|o| o.uploaded_count < MAX_IMAGES_PER_OWNER && !attached.contains(&o.id))
                .collect();
            debug!(
                %kind,
                listed = listed_count,
                already_attached = attached.len(),
                eligible = eligible.len(),
                "batch add eligibility"
            );
            eligible
        };

        if eligible.is_empty() {
            info!(%kind, media_service_id = %asset.media_service_id, "no eligible owners for batch add");
            return Ok(0);
        }

        let mut tx = self.db.begin().await?;
        let mut repo = adapter.bind(&mut *tx);

        repo.upsert_asset(asset).await?;
        repo.append_association_batch(&eligible, &asset.media_service_id)
            .await?;

        let updates: Vec<FieldUpdate> = eligible
            .iter()
            .map(|owner| FieldUpdate::counter_step(owner, 1))
            .collect();
        let written = repo.batch_set_field(&updates).await?;
        if written != eligible.len() as u64 {
            warn!(
                %kind,
                expected = eligible.len(),
                written,
                "counters changed since eligibility check, rolling back"
            );
            return Err(CatalogError::ConcurrentUpdate { kind });
        }

        tx.commit().await?;
        info!(
            %kind,
            media_service_id = %asset.media_service_id,
            owners = eligible.len(),
            "image attached to batch"
        );
        Ok(eligible.len())
    }

    /// Detach `media_service_id` from the listed owners.
    ///
    /// Counters are decremented only for owners that actually held the asset.
    /// Returns the number of those owners.
    pub async fn delete_image_batch(
        &self,
        owner_type: &str,
        owner_ids: &[String],
        media_service_id: &str,
    ) -> CatalogResult<usize> {
        ensure_media_service_id(media_service_id)?;
        let ids = normalize_owner_ids(owner_ids)?;
        let adapter = self.registry.resolve(owner_type)?;
        let kind = adapter.kind();

        let mut tx = self.db.begin().await?;
        let mut repo = adapter.bind(&mut *tx);

        let owners = repo.list_including_unpublished(&ids).await?;
        if owners.is_empty() {
            return Err(CatalogError::OwnersNotFound(kind));
        }

        let listed: Vec<String> = owners.iter().map(|o| o.id.clone()).collect();
        let associated = repo
            .find_associated_owner_ids(media_service_id, &listed)
            .await?;
        if associated.is_empty() {
            return Err(CatalogError::AssociationsNotFound(
                media_service_id.to_string(),
            ));
        }

        let removed = repo
            .remove_association_batch(&owners, media_service_id)
            .await?;
        let decremented = repo.decrement_counter(&associated).await?;
        if removed != associated.len() as u64 || decremented != associated.len() as u64 {
            warn!(
                %kind,
                associated = associated.len(),
                removed,
                decremented,
                "association and counter writes disagree, rolling back"
            );
            return Err(CatalogError::ConcurrentUpdate { kind });
        }

        tx.commit().await?;
        info!(
            %kind,
            media_service_id,
            owners = associated.len(),
            "image detached from batch"
        );
        Ok(associated.len())
    }
}
