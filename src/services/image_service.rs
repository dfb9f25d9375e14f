//! Attach and detach one media asset on one owner.
//!
//! The eligibility read, the association write and the counter write share a
//! transaction, and the counter write is guarded by the value read, so a
//! committed change always leaves `uploaded_count` equal to the number of
//! association rows.

use crate::{
    models::{media::NewMediaAsset, owner::MAX_IMAGES_PER_OWNER},
    services::{
        catalog_service::CatalogService,
        error::{CatalogError, CatalogResult},
        owner_adapter::FieldUpdate,
        validation::{ensure_asset, ensure_media_service_id, ensure_owner_id},
    },
};
use std::slice;
use tracing::{debug, info, warn};

impl CatalogService {
    /// Attach `asset` to one owner and bump its counter.
    ///
    /// Fails with `ImageLimitExceeded` at the limit and `ImageAlreadyAttached`
    /// when the pair exists; both leave storage untouched.
    pub async fn add_image(
        &self,
        owner_type: &str,
        owner_id: &str,
        asset: &NewMediaAsset,
    ) -> CatalogResult<()> {
        ensure_owner_id(owner_id)?;
        ensure_asset(asset)?;
        let adapter = self.registry.resolve(owner_type)?;
        let kind = adapter.kind();

        let mut tx = self.db.begin().await?;
        let mut repo = adapter.bind(&mut *tx);

        let owner = repo.fetch_including_unpublished(owner_id).await?;
        if owner.uploaded_count >= MAX_IMAGES_PER_OWNER {
            debug!(%kind, id = owner_id, count = owner.uploaded_count, "image limit reached");
            return Err(CatalogError::ImageLimitExceeded {
                kind,
                id: owner.id,
                limit: MAX_IMAGES_PER_OWNER,
            });
        }

        let attached = repo
            .find_associated_owner_ids(&asset.media_service_id, slice::from_ref(&owner.id))
            .await?;
        if !attached.is_empty() {
            return Err(CatalogError::ImageAlreadyAttached {
                kind,
                id: owner.id,
                media_service_id: asset.media_service_id.clone(),
            });
        }

        repo.upsert_asset(asset).await?;
        repo.append_association(&owner, &asset.media_service_id).await?;

        let written = repo
            .batch_set_field(&[FieldUpdate::counter_step(&owner, 1)])
            .await?;
        if written != 1 {
            warn!(%kind, id = owner_id, "counter changed since it was read, rolling back");
            return Err(CatalogError::ConcurrentUpdate { kind });
        }

        tx.commit().await?;
        info!(
            %kind,
            id = owner_id,
            media_service_id = %asset.media_service_id,
            count = owner.uploaded_count + 1,
            "image attached"
        );
        Ok(())
    }

    /// Detach one asset from one owner and decrement its counter.
    pub async fn delete_image(
        &self,
        owner_type: &str,
        owner_id: &str,
        media_service_id: &str,
    ) -> CatalogResult<()> {
        ensure_owner_id(owner_id)?;
        ensure_media_service_id(media_service_id)?;
        let adapter = self.registry.resolve(owner_type)?;
        let kind = adapter.kind();

        let mut tx = self.db.begin().await?;
        let mut repo = adapter.bind(&mut *tx);

        let owner = repo.fetch_including_unpublished(owner_id).await?;
        repo.remove_association(&owner, media_service_id).await?;

        let written = repo.decrement_counter(slice::from_ref(&owner.id)).await?;
        if written != 1 {
            warn!(%kind, id = owner_id, "counter already zero with an association present");
            return Err(CatalogError::ConcurrentUpdate { kind });
        }

        tx.commit().await?;
        info!(%kind, id = owner_id, media_service_id, "image detached");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        models::owner::OwnerKind,
        services::error::CatalogError,
        test_support::{
            asset, associations, counter, is_attached, seed_owner, seeded_asset, service,
            set_counter,
        },
    };

    #[tokio::test]
    async fn add_below_limit_increments_by_one() {
        let svc = service().await;
        for start in 0..5 {
            let id = seed_owner(&svc, OwnerKind::Course, start).await;
            svc.add_image("course", &id, &asset(&format!("new-{start}")))
                .await
                .unwrap();
            assert_eq!(counter(&svc, OwnerKind::Course, &id).await, start + 1);
            assert_eq!(associations(&svc, OwnerKind::Course, &id).await, start + 1);
        }
    }

    #[tokio::test]
    async fn add_at_limit_changes_nothing() {
        let svc = service().await;
        let id = seed_owner(&svc, OwnerKind::Seminar, 5).await;

        let err = svc.add_image("seminar", &id, &asset("late")).await.unwrap_err();
        assert!(matches!(err, CatalogError::ImageLimitExceeded { limit: 5, .. }));
        assert_eq!(counter(&svc, OwnerKind::Seminar, &id).await, 5);
        assert_eq!(associations(&svc, OwnerKind::Seminar, &id).await, 5);
        assert!(!is_attached(&svc, OwnerKind::Seminar, &id, "late").await);
    }

    #[tokio::test]
    async fn add_to_unknown_owner_or_kind() {
        let svc = service().await;
        assert!(matches!(
            svc.add_image("course", "missing", &asset("a")).await,
            Err(CatalogError::OwnerNotFound { .. })
        ));
        assert!(matches!(
            svc.add_image("album", "missing", &asset("a")).await,
            Err(CatalogError::UnknownOwnerType(_))
        ));
    }

    #[tokio::test]
    async fn add_validates_before_routing() {
        let svc = service().await;
        let mut bad = asset("a");
        bad.secure_url = "ftp://media.example.com/a.jpg".into();
        assert!(matches!(
            svc.add_image("album", "o-1", &bad).await,
            Err(CatalogError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_add_is_rejected_without_double_counting() {
        let svc = service().await;
        let id = seed_owner(&svc, OwnerKind::PhysicalGood, 1).await;
        svc.add_image("physical-good", &id, &asset("dup")).await.unwrap();

        let err = svc
            .add_image("physical-good", &id, &asset("dup"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ImageAlreadyAttached { .. }));
        assert_eq!(counter(&svc, OwnerKind::PhysicalGood, &id).await, 2);
    }

    #[tokio::test]
    async fn shared_asset_can_attach_to_several_owners() {
        let svc = service().await;
        let a = seed_owner(&svc, OwnerKind::CoursePart, 0).await;
        let b = seed_owner(&svc, OwnerKind::CoursePart, 0).await;
        svc.add_image("course-part", &a, &asset("shared")).await.unwrap();
        svc.add_image("course-part", &b, &asset("shared")).await.unwrap();

        let fetched = svc.get_owner("course-part", &b).await.unwrap();
        assert_eq!(fetched.media.len(), 1);
        assert_eq!(fetched.media[0].media_service_id, "shared");
        assert_eq!(fetched.media[0].secure_url, "https://media.example.com/shared.jpg");
    }

    #[tokio::test]
    async fn delete_decrements_and_detaches() {
        let svc = service().await;
        let id = seed_owner(&svc, OwnerKind::TrainingSession, 2).await;
        svc.add_image("training-session", &id, &asset("x")).await.unwrap();

        svc.delete_image("training-session", &id, "x").await.unwrap();
        assert_eq!(counter(&svc, OwnerKind::TrainingSession, &id).await, 2);
        assert!(!is_attached(&svc, OwnerKind::TrainingSession, &id, "x").await);
    }

    #[tokio::test]
    async fn delete_distinguishes_missing_owner_from_missing_image() {
        let svc = service().await;
        let id = seed_owner(&svc, OwnerKind::Course, 1).await;

        assert!(matches!(
            svc.delete_image("course", "ghost", "x").await,
            Err(CatalogError::OwnerNotFound { .. })
        ));
        assert!(matches!(
            svc.delete_image("course", &id, "never-attached").await,
            Err(CatalogError::ImageNotFoundOnOwner { .. })
        ));
        assert_eq!(counter(&svc, OwnerKind::Course, &id).await, 1);
    }

    #[tokio::test]
    async fn limit_scenario_round_trip() {
        let svc = service().await;
        let o = seed_owner(&svc, OwnerKind::Course, 4).await;
        let p = seed_owner(&svc, OwnerKind::Course, 5).await;

        svc.add_image("course", &o, &asset("asset-a")).await.unwrap();
        assert_eq!(counter(&svc, OwnerKind::Course, &o).await, 5);

        assert!(matches!(
            svc.add_image("course", &o, &asset("asset-b")).await,
            Err(CatalogError::ImageLimitExceeded { .. })
        ));
        assert_eq!(counter(&svc, OwnerKind::Course, &o).await, 5);

        svc.delete_image("course", &o, "asset-a").await.unwrap();
        assert_eq!(counter(&svc, OwnerKind::Course, &o).await, 4);

        let affected = svc
            .add_image_batch("course", &[o.clone(), p.clone()], &asset("asset-c"))
            .await
            .unwrap();
        assert_eq!(affected, 1);
        assert!(is_attached(&svc, OwnerKind::Course, &o, "asset-c").await);
        assert!(!is_attached(&svc, OwnerKind::Course, &p, "asset-c").await);
        assert_eq!(counter(&svc, OwnerKind::Course, &o).await, 5);
        assert_eq!(counter(&svc, OwnerKind::Course, &p).await, 5);
    }

    #[tokio::test]
    async fn delete_rolls_back_when_counter_disagrees() {
        let svc = service().await;
        let id = seed_owner(&svc, OwnerKind::Course, 1).await;
        set_counter(&svc, OwnerKind::Course, &id, 0).await;
        let attached = seeded_asset(&id, 0);

        let err = svc.delete_image("course", &id, &attached).await.unwrap_err();
        assert!(matches!(err, CatalogError::ConcurrentUpdate { kind: OwnerKind::Course }));
        assert!(is_attached(&svc, OwnerKind::Course, &id, &attached).await);
        assert_eq!(associations(&svc, OwnerKind::Course, &id).await, 1);
        assert_eq!(counter(&svc, OwnerKind::Course, &id).await, 0);
    }
}
