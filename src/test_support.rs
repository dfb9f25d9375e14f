//! Fixtures shared by the service and handler tests.

use crate::{
    db::test_pool,
    models::{
        media::NewMediaAsset,
        owner::{NewOwner, OwnerKind},
    },
    services::catalog_service::CatalogService,
};
use chrono::Utc;
use std::sync::Arc;

pub async fn service() -> CatalogService {
    CatalogService::new(Arc::new(test_pool().await))
}

pub fn asset(media_service_id: &str) -> NewMediaAsset {
    NewMediaAsset {
        url: format!("http://media.example.com/{media_service_id}.jpg"),
        secure_url: format!("https://media.example.com/{media_service_id}.jpg"),
        public_id: format!("catalog/{media_service_id}"),
        media_service_id: media_service_id.to_string(),
    }
}

/// Create a draft owner already holding `images` consistent associations.
pub async fn seed_owner(svc: &CatalogService, kind: OwnerKind, images: i64) -> String {
    let owner = svc
        .create_owner(
            kind.as_str(),
            NewOwner {
                name: "fixture".into(),
                short_description: None,
                published: false,
            },
        )
        .await
        .unwrap();

    let table = kind.table();
    for i in 0..images {
        let seeded = asset(&seeded_asset(&owner.id, i));
        sqlx::query(
            "INSERT INTO media_assets (media_service_id, url, secure_url, public_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&seeded.media_service_id)
        .bind(&seeded.url)
        .bind(&seeded.secure_url)
        .bind(&seeded.public_id)
        .bind(Utc::now())
        .execute(&*svc.db)
        .await
        .unwrap();
        sqlx::query(&format!(
            "INSERT INTO {} ({}, media_service_id, created_at) VALUES (?, ?, ?)",
            table.join_table, table.owner_column
        ))
        .bind(&owner.id)
        .bind(&seeded.media_service_id)
        .bind(Utc::now())
        .execute(&*svc.db)
        .await
        .unwrap();
    }
    set_counter(svc, kind, &owner.id, images).await;

    owner.id
}

/// Id of the `n`th asset attached by [`seed_owner`].
pub fn seeded_asset(owner_id: &str, n: i64) -> String {
    format!("seed-{owner_id}-{n}")
}

/// Overwrite the stored counter without touching associations.
pub async fn set_counter(svc: &CatalogService, kind: OwnerKind, id: &str, value: i64) {
    sqlx::query(&format!(
        "UPDATE {} SET uploaded_count = ? WHERE id = ?",
        kind.table().table
    ))
    .bind(value)
    .bind(id)
    .execute(&*svc.db)
    .await
    .unwrap();
}

/// Stored counter value.
pub async fn counter(svc: &CatalogService, kind: OwnerKind, id: &str) -> i64 {
    sqlx::query_scalar(&format!(
        "SELECT uploaded_count FROM {} WHERE id = ?",
        kind.table().table
    ))
    .bind(id)
    .fetch_one(&*svc.db)
    .await
    .unwrap()
}

/// Number of association rows, the value the counter must mirror.
pub async fn associations(svc: &CatalogService, kind: OwnerKind, id: &str) -> i64 {
    let table = kind.table();
    sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ?",
        table.join_table, table.owner_column
    ))
    .bind(id)
    .fetch_one(&*svc.db)
    .await
    .unwrap()
}

pub async fn is_attached(svc: &CatalogService, kind: OwnerKind, id: &str, media_service_id: &str) -> bool {
    let table = kind.table();
    let hits: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ? AND media_service_id = ?",
        table.join_table, table.owner_column
    ))
    .bind(id)
    .bind(media_service_id)
    .fetch_one(&*svc.db)
    .await
    .unwrap();
    hits > 0
}
