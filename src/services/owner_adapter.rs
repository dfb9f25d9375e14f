//! Uniform media capabilities over every owner kind.
//!
//! An [`OwnerAdapter`] knows the storage layout of one kind. It issues no
//! statements itself: [`OwnerAdapter::bind`] attaches it to a connection
//! (normally the caller's open transaction) and every capability runs on that
//! connection, so the adapter never opens a transaction of its own.

use crate::{
    models::{
        media::{MediaAsset, NewMediaAsset},
        owner::{NewOwner, Owner, OwnerKind, OwnerTable},
    },
    services::error::{CatalogError, CatalogResult},
};
use chrono::Utc;
use sqlx::{QueryBuilder, SqliteConnection, sqlite::Sqlite};
use std::{collections::HashSet, str::FromStr};
use tracing::debug;

/// Column addressed by a batch field update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSelector {
    Name,
    ShortDescription,
    UploadedCount,
}

impl FieldSelector {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldSelector::Name => "name",
            FieldSelector::ShortDescription => "short-description",
            FieldSelector::UploadedCount => "uploaded-count",
        }
    }
}

impl FromStr for FieldSelector {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(FieldSelector::Name),
            "short-description" | "shortDescription" => Ok(FieldSelector::ShortDescription),
            "uploaded-count" | "uploadedCount" => Ok(FieldSelector::UploadedCount),
            other => Err(CatalogError::InvalidArgument(format!(
                "unknown field selector `{other}`"
            ))),
        }
    }
}

/// Target value for one owner in a batch field update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Name(String),
    ShortDescription(Option<String>),
    /// Counter write that only applies while the stored value is `expected`.
    UploadedCount { expected: i64, new: i64 },
}

impl FieldValue {
    pub fn selector(&self) -> FieldSelector {
        match self {
            FieldValue::Name(_) => FieldSelector::Name,
            FieldValue::ShortDescription(_) => FieldSelector::ShortDescription,
            FieldValue::UploadedCount { .. } => FieldSelector::UploadedCount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldUpdate {
    pub owner_id: String,
    pub value: FieldValue,
}

impl FieldUpdate {
    /// Move `owner`'s counter by `delta` from the value it was read with.
    pub fn counter_step(owner: &Owner, delta: i64) -> Self {
        FieldUpdate {
            owner_id: owner.id.clone(),
            value: FieldValue::UploadedCount {
                expected: owner.uploaded_count,
                new: owner.uploaded_count + delta,
            },
        }
    }
}

/// Storage layout of one owner kind, ready to be bound to a connection.
#[derive(Debug, Clone, Copy)]
pub struct OwnerAdapter {
    kind: OwnerKind,
    table: &'static OwnerTable,
}

impl OwnerAdapter {
    pub fn new(kind: OwnerKind) -> Self {
        Self {
            kind,
            table: kind.table(),
        }
    }

    pub fn kind(&self) -> OwnerKind {
        self.kind
    }

    /// Scope the adapter to `conn`, usually `&mut *tx` of an open transaction.
    pub fn bind<'c>(&self, conn: &'c mut SqliteConnection) -> BoundAdapter<'c> {
        BoundAdapter {
            kind: self.kind,
            table: self.table,
            conn,
        }
    }
}

/// An [`OwnerAdapter`] bound to a live connection.
pub struct BoundAdapter<'c> {
    kind: OwnerKind,
    table: &'static OwnerTable,
    conn: &'c mut SqliteConnection,
}

fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[String]) {
    builder.push("(");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(")");
}

impl BoundAdapter<'_> {
    fn owner_select(&self) -> String {
        format!(
            "SELECT id, {} AS name, {} AS short_description, published, uploaded_count FROM {}",
            self.table.name_column, self.table.description_column, self.table.table
        )
    }

    /// Fetch one owner regardless of its published flag.
    pub async fn fetch_including_unpublished(&mut self, id: &str) -> CatalogResult<Owner> {
        let sql = format!(
            "{} WHERE id = ?{}",
            self.owner_select(),
            self.table.live_filter()
        );
        sqlx::query_as::<_, Owner>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or_else(|| CatalogError::OwnerNotFound {
                kind: self.kind,
                id: id.to_string(),
            })
    }

    /// Fetch the owners among `ids` that exist. Unknown ids are skipped.
    pub async fn list_including_unpublished(&mut self, ids: &[String]) -> CatalogResult<Vec<Owner>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(self.owner_select());
        builder.push(" WHERE id IN ");
        push_id_list(&mut builder, ids);
        builder.push(self.table.live_filter());
        builder.push(" ORDER BY id");

        let owners: Vec<Owner> = builder.build_query_as().fetch_all(&mut *self.conn).await?;
        if owners.len() < ids.len() {
            debug!(
                kind = %self.kind,
                requested = ids.len(),
                found = owners.len(),
                "dropped unknown owner ids"
            );
        }
        Ok(owners)
    }

    /// Record the asset reference unless the media service id is already known.
    pub async fn upsert_asset(&mut self, asset: &NewMediaAsset) -> CatalogResult<()> {
        sqlx::query(
            "INSERT INTO media_assets (media_service_id, url, secure_url, public_id, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(media_service_id) DO NOTHING",
        )
        .bind(&asset.media_service_id)
        .bind(&asset.url)
        .bind(&asset.secure_url)
        .bind(&asset.public_id)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    pub async fn append_association(
        &mut self,
        owner: &Owner,
        media_service_id: &str,
    ) -> CatalogResult<()> {
        let sql = format!(
            "INSERT INTO {} ({}, media_service_id, created_at) VALUES (?, ?, ?)",
            self.table.join_table, self.table.owner_column
        );
        sqlx::query(&sql)
            .bind(&owner.id)
            .bind(media_service_id)
            .bind(Utc::now())
            .execute(&mut *self.conn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    CatalogError::ImageAlreadyAttached {
                        kind: self.kind,
                        id: owner.id.clone(),
                        media_service_id: media_service_id.to_string(),
                    }
                } else {
                    err.into()
                }
            })?;
        Ok(())
    }

    /// Attach one asset to every owner in a single multi-row insert.
    pub async fn append_association_batch(
        &mut self,
        owners: &[Owner],
        media_service_id: &str,
    ) -> CatalogResult<u64> {
        if owners.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "INSERT INTO {} ({}, media_service_id, created_at) ",
            self.table.join_table, self.table.owner_column
        ));
        builder.push_values(owners, |mut row, owner| {
            row.push_bind(owner.id.clone())
                .push_bind(media_service_id.to_string())
                .push_bind(now);
        });

        // A pair attached after the caller's eligibility read trips the primary key.
        let kind = self.kind;
        let result = builder
            .build()
            .execute(&mut *self.conn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    debug!(%kind, media_service_id, "association appeared concurrently");
                    CatalogError::ConcurrentUpdate { kind }
                } else {
                    err.into()
                }
            })?;
        Ok(result.rows_affected())
    }

    pub async fn remove_association(
        &mut self,
        owner: &Owner,
        media_service_id: &str,
    ) -> CatalogResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ? AND media_service_id = ?",
            self.table.join_table, self.table.owner_column
        );
        let result = sqlx::query(&sql)
            .bind(&owner.id)
            .bind(media_service_id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::ImageNotFoundOnOwner {
                kind: self.kind,
                id: owner.id.clone(),
                media_service_id: media_service_id.to_string(),
            });
        }
        Ok(())
    }

    /// Detach the asset from every owner given. Owners without it are untouched.
    pub async fn remove_association_batch(
        &mut self,
        owners: &[Owner],
        media_service_id: &str,
    ) -> CatalogResult<u64> {
        if owners.is_empty() {
            return Ok(0);
        }

        let ids: Vec<String> = owners.iter().map(|o| o.id.clone()).collect();
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "DELETE FROM {} WHERE media_service_id = ",
            self.table.join_table
        ));
        builder.push_bind(media_service_id.to_string());
        builder.push(format!(" AND {} IN ", self.table.owner_column));
        push_id_list(&mut builder, &ids);

        let result = builder.build().execute(&mut *self.conn).await?;
        Ok(result.rows_affected())
    }

    /// Subset of `candidate_ids` currently associated with the asset.
    pub async fn find_associated_owner_ids(
        &mut self,
        media_service_id: &str,
        candidate_ids: &[String],
    ) -> CatalogResult<Vec<String>> {
        if candidate_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {col} FROM {} WHERE media_service_id = ",
            self.table.join_table,
            col = self.table.owner_column
        ));
        builder.push_bind(media_service_id.to_string());
        builder.push(format!(" AND {} IN ", self.table.owner_column));
        push_id_list(&mut builder, candidate_ids);
        builder.push(format!(" ORDER BY {}", self.table.owner_column));

        let ids: Vec<String> = builder
            .build_query_scalar()
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(ids)
    }

    /// Decrement the counter of each id by one. Counters already at zero are
    /// left alone, so the affected row count can be lower than `ids.len()`.
    pub async fn decrement_counter(&mut self, ids: &[String]) -> CatalogResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "UPDATE {} SET uploaded_count = uploaded_count - 1 WHERE id IN ",
            self.table.table
        ));
        push_id_list(&mut builder, ids);
        builder.push(" AND uploaded_count > 0");

        let result = builder.build().execute(&mut *self.conn).await?;
        Ok(result.rows_affected())
    }

    /// Write a per-owner value of one field in a single statement.
    ///
    /// Every update must target the same [`FieldSelector`]; mixed batches are
    /// rejected before anything is sent. Counter updates are compare-and-swap:
    /// a row whose stored count differs from `expected` is not written, which
    /// shows up as a lower affected row count.
    pub async fn batch_set_field(&mut self, updates: &[FieldUpdate]) -> CatalogResult<u64> {
        let Some(first) = updates.first() else {
            return Ok(0);
        };
        let selector = first.value.selector();

        let mut seen = HashSet::with_capacity(updates.len());
        for update in updates {
            let other = update.value.selector();
            if other != selector {
                return Err(CatalogError::HeterogeneousBatch {
                    first: selector.as_str(),
                    other: other.as_str(),
                });
            }
            if !seen.insert(update.owner_id.as_str()) {
                return Err(CatalogError::InvalidArgument(format!(
                    "owner `{}` appears twice in one field batch",
                    update.owner_id
                )));
            }
        }

        let column = match selector {
            FieldSelector::Name => self.table.name_column,
            FieldSelector::ShortDescription => self.table.description_column,
            FieldSelector::UploadedCount => "uploaded_count",
        };

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "UPDATE {} SET {} = CASE id",
            self.table.table, column
        ));
        for update in updates {
            builder
                .push(" WHEN ")
                .push_bind(update.owner_id.clone())
                .push(" THEN ");
            match &update.value {
                FieldValue::Name(value) => builder.push_bind(value.clone()),
                FieldValue::ShortDescription(value) => builder.push_bind(value.clone()),
                FieldValue::UploadedCount { new, .. } => builder.push_bind(*new),
            };
        }
        builder.push(" END WHERE id IN ");
        let ids: Vec<String> = updates.iter().map(|u| u.owner_id.clone()).collect();
        push_id_list(&mut builder, &ids);

        if selector == FieldSelector::UploadedCount {
            builder.push(" AND uploaded_count = CASE id");
            for update in updates {
                if let FieldValue::UploadedCount { expected, .. } = update.value {
                    builder
                        .push(" WHEN ")
                        .push_bind(update.owner_id.clone())
                        .push(" THEN ")
                        .push_bind(expected);
                }
            }
            builder.push(" END");
        }
        builder.push(self.table.live_filter());

        let result = builder.build().execute(&mut *self.conn).await?;
        debug!(
            kind = %self.kind,
            field = selector.as_str(),
            requested = updates.len(),
            written = result.rows_affected(),
            "batch field update"
        );
        Ok(result.rows_affected())
    }

    /// Assets attached to one owner, oldest association first.
    pub async fn list_media(&mut self, owner_id: &str) -> CatalogResult<Vec<MediaAsset>> {
        let sql = format!(
            "SELECT a.media_service_id, a.url, a.secure_url, a.public_id, a.created_at
             FROM media_assets a
             JOIN {join} j ON j.media_service_id = a.media_service_id
             WHERE j.{col} = ?
             ORDER BY j.created_at, a.media_service_id",
            join = self.table.join_table,
            col = self.table.owner_column
        );
        let media = sqlx::query_as::<_, MediaAsset>(&sql)
            .bind(owner_id)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(media)
    }

    pub async fn insert_owner(&mut self, id: &str, new: &NewOwner) -> CatalogResult<Owner> {
        let sql = format!(
            "INSERT INTO {} (id, {}, {}, published, uploaded_count, created_at)
             VALUES (?, ?, ?, ?, 0, ?)",
            self.table.table, self.table.name_column, self.table.description_column
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(&new.name)
            .bind(&new.short_description)
            .bind(new.published)
            .bind(Utc::now())
            .execute(&mut *self.conn)
            .await?;

        Ok(Owner {
            id: id.to_string(),
            name: new.name.clone(),
            short_description: new.short_description.clone(),
            published: new.published,
            uploaded_count: 0,
        })
    }
}

/// Return true if SQLx error indicates a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use std::slice;

    async fn seed(conn: &mut SqliteConnection, kind: OwnerKind, id: &str, count: i64) -> Owner {
        let mut repo = OwnerAdapter::new(kind).bind(conn);
        let owner = repo
            .insert_owner(
                id,
                &NewOwner {
                    name: format!("{id} name"),
                    short_description: None,
                    published: false,
                },
            )
            .await
            .unwrap();
        let updates = [FieldUpdate {
            owner_id: id.to_string(),
            value: FieldValue::UploadedCount {
                expected: 0,
                new: count,
            },
        }];
        repo.batch_set_field(&updates).await.unwrap();
        Owner {
            uploaded_count: count,
            ..owner
        }
    }

    #[tokio::test]
    async fn fetch_includes_unpublished_owners() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        seed(&mut conn, OwnerKind::Course, "c-1", 0).await;

        let owner = OwnerAdapter::new(OwnerKind::Course)
            .bind(&mut conn)
            .fetch_including_unpublished("c-1")
            .await
            .unwrap();
        assert!(!owner.published);
        assert_eq!(owner.name, "c-1 name");
    }

    #[tokio::test]
    async fn fetch_missing_owner_is_owner_not_found() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let err = OwnerAdapter::new(OwnerKind::PhysicalGood)
            .bind(&mut conn)
            .fetch_including_unpublished("nope")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::OwnerNotFound { kind: OwnerKind::PhysicalGood, .. }));
    }

    #[tokio::test]
    async fn list_skips_unknown_ids() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        seed(&mut conn, OwnerKind::TrainingSession, "t-1", 1).await;
        seed(&mut conn, OwnerKind::TrainingSession, "t-2", 2).await;

        let ids = vec!["t-2".to_string(), "ghost".to_string(), "t-1".to_string()];
        let owners = OwnerAdapter::new(OwnerKind::TrainingSession)
            .bind(&mut conn)
            .list_including_unpublished(&ids)
            .await
            .unwrap();
        let found: Vec<_> = owners.iter().map(|o| (o.id.as_str(), o.uploaded_count)).collect();
        assert_eq!(found, vec![("t-1", 1), ("t-2", 2)]);
    }

    #[tokio::test]
    async fn empty_field_batch_is_a_no_op() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let written = OwnerAdapter::new(OwnerKind::Course)
            .bind(&mut conn)
            .batch_set_field(&[])
            .await
            .unwrap();
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn mixed_field_batch_is_rejected() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        seed(&mut conn, OwnerKind::Course, "c-1", 0).await;
        seed(&mut conn, OwnerKind::Course, "c-2", 0).await;

        let updates = [
            FieldUpdate {
                owner_id: "c-1".into(),
                value: FieldValue::Name("Renamed".into()),
            },
            FieldUpdate {
                owner_id: "c-2".into(),
                value: FieldValue::ShortDescription(Some("text".into())),
            },
        ];
        let err = OwnerAdapter::new(OwnerKind::Course)
            .bind(&mut conn)
            .batch_set_field(&updates)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::HeterogeneousBatch {
                first: "name",
                other: "short-description"
            }
        ));
    }

    #[tokio::test]
    async fn field_batch_writes_distinct_values_per_owner() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        seed(&mut conn, OwnerKind::TrainingSession, "t-1", 0).await;
        seed(&mut conn, OwnerKind::TrainingSession, "t-2", 0).await;

        let updates = [
            FieldUpdate {
                owner_id: "t-1".into(),
                value: FieldValue::ShortDescription(Some("first".into())),
            },
            FieldUpdate {
                owner_id: "t-2".into(),
                value: FieldValue::ShortDescription(Some("second".into())),
            },
        ];
        let mut repo = OwnerAdapter::new(OwnerKind::TrainingSession).bind(&mut conn);
        assert_eq!(repo.batch_set_field(&updates).await.unwrap(), 2);

        let ids = vec!["t-1".to_string(), "t-2".to_string()];
        let owners = repo.list_including_unpublished(&ids).await.unwrap();
        assert_eq!(owners[0].short_description.as_deref(), Some("first"));
        assert_eq!(owners[1].short_description.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn stale_counter_write_is_skipped() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let owner = seed(&mut conn, OwnerKind::Course, "c-1", 3).await;
        let stale = Owner {
            uploaded_count: 2,
            ..owner
        };

        let mut repo = OwnerAdapter::new(OwnerKind::Course).bind(&mut conn);
        let written = repo
            .batch_set_field(&[FieldUpdate::counter_step(&stale, 1)])
            .await
            .unwrap();
        assert_eq!(written, 0);
        let reread = repo.fetch_including_unpublished("c-1").await.unwrap();
        assert_eq!(reread.uploaded_count, 3);
    }

    #[tokio::test]
    async fn decrement_never_goes_below_zero() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        seed(&mut conn, OwnerKind::PhysicalGood, "g-1", 0).await;
        seed(&mut conn, OwnerKind::PhysicalGood, "g-2", 2).await;

        let mut repo = OwnerAdapter::new(OwnerKind::PhysicalGood).bind(&mut conn);
        let ids = vec!["g-1".to_string(), "g-2".to_string()];
        assert_eq!(repo.decrement_counter(&ids).await.unwrap(), 1);

        let owners = repo.list_including_unpublished(&ids).await.unwrap();
        assert_eq!(owners[0].uploaded_count, 0);
        assert_eq!(owners[1].uploaded_count, 1);
    }

    #[tokio::test]
    async fn existing_pairs_map_to_domain_errors() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let owner = seed(&mut conn, OwnerKind::Seminar, "s-1", 0).await;

        let mut repo = OwnerAdapter::new(OwnerKind::Seminar).bind(&mut conn);
        repo.append_association(&owner, "poster").await.unwrap();

        assert!(matches!(
            repo.append_association(&owner, "poster").await,
            Err(CatalogError::ImageAlreadyAttached { kind: OwnerKind::Seminar, .. })
        ));
        assert!(matches!(
            repo.append_association_batch(slice::from_ref(&owner), "poster").await,
            Err(CatalogError::ConcurrentUpdate { kind: OwnerKind::Seminar })
        ));
        let ids = vec!["s-1".to_string()];
        assert_eq!(repo.find_associated_owner_ids("poster", &ids).await.unwrap(), ids);
    }
}
