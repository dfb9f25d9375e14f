//! Publish / unpublish / soft-delete / restore / purge for lifecycle-managed
//! owners, and the three read scopes over them.
//!
//! One [`LifecycleRepository`] serves every kind: it is parametrized by the
//! table and its [`VisibilityColumns`], so the scope queries exist once.

use crate::{
    models::{
        owner::{OwnerKind, OwnerTable},
        visibility::{
            ScopeListing, ScopePage, VisibilityColumns, VisibilityScope, VisibleKind,
            VisibleRecord,
        },
    },
    services::{
        catalog_service::CatalogService,
        error::{CatalogError, CatalogResult},
        validation::ensure_owner_id,
    },
};
use chrono::Utc;
use sqlx::{QueryBuilder, SqliteConnection, sqlite::Sqlite};
use tracing::info;

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 100;

struct LifecycleRepository<'c> {
    kind: OwnerKind,
    table: &'static OwnerTable,
    cols: VisibilityColumns,
    conn: &'c mut SqliteConnection,
}

impl<'c> LifecycleRepository<'c> {
    fn bind(kind: VisibleKind, conn: &'c mut SqliteConnection) -> CatalogResult<Self> {
        let owner_kind = kind.owner_kind();
        let table = owner_kind.table();
        let cols = table
            .visibility
            .ok_or(CatalogError::VisibilityUnsupported(owner_kind))?;
        Ok(Self {
            kind: owner_kind,
            table,
            cols,
            conn,
        })
    }

    fn record_select(&self) -> String {
        format!(
            "SELECT id, {} AS name, {} AS published, {} AS deleted_at FROM {}",
            self.table.name_column, self.cols.published, self.cols.deleted_at, self.table.table
        )
    }

    fn not_found(&self, id: &str) -> CatalogError {
        CatalogError::RecordNotFound {
            kind: self.kind,
            id: id.to_string(),
        }
    }

    /// Fetch a record in any scope.
    async fn fetch(&mut self, id: &str) -> CatalogResult<VisibleRecord> {
        let sql = format!("{} WHERE id = ?", self.record_select());
        sqlx::query_as::<_, VisibleRecord>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    async fn set_published(&mut self, id: &str, published: bool) -> CatalogResult<u64> {
        let sql = format!(
            "UPDATE {} SET {} = ? WHERE id = ?",
            self.table.table, self.cols.published
        );
        let result = sqlx::query(&sql)
            .bind(published)
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected())
    }

    async fn set_deleted_at(
        &mut self,
        id: &str,
        deleted_at: Option<chrono::DateTime<Utc>>,
    ) -> CatalogResult<u64> {
        let sql = format!(
            "UPDATE {} SET {} = ? WHERE id = ?",
            self.table.table, self.cols.deleted_at
        );
        let result = sqlx::query(&sql)
            .bind(deleted_at)
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Remove the row and its associations.
    async fn purge(&mut self, id: &str) -> CatalogResult<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            self.table.join_table, self.table.owner_column
        );
        sqlx::query(&sql).bind(id).execute(&mut *self.conn).await?;

        let sql = format!("DELETE FROM {} WHERE id = ?", self.table.table);
        let result = sqlx::query(&sql).bind(id).execute(&mut *self.conn).await?;
        Ok(result.rows_affected())
    }

    /// One keyset page of the rows in `scope`, ordered by id.
    async fn list(&mut self, scope: VisibilityScope, page: &ScopePage) -> CatalogResult<ScopeListing> {
        let limit = page.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let fetch_limit = limit + 1;

        let mut builder = QueryBuilder::<Sqlite>::new(self.record_select());
        builder.push(" WHERE ");
        builder.push(scope.predicate(self.cols));
        if let Some(after) = &page.after {
            builder.push(" AND id > ");
            builder.push_bind(after.clone());
        }
        builder.push(" ORDER BY id ASC LIMIT ");
        builder.push_bind(fetch_limit as i64);

        let mut records: Vec<VisibleRecord> =
            builder.build_query_as().fetch_all(&mut *self.conn).await?;

        let mut next_after = None;
        if records.len() == fetch_limit {
            records.pop();
            next_after = records.last().map(|r| r.id.clone());
        }

        Ok(ScopeListing {
            records,
            next_after,
        })
    }
}

impl CatalogService {
    pub async fn publish(&self, kind: &str, id: &str) -> CatalogResult<VisibleRecord> {
        self.set_published(kind, id, true).await
    }

    pub async fn unpublish(&self, kind: &str, id: &str) -> CatalogResult<VisibleRecord> {
        self.set_published(kind, id, false).await
    }

    /// Set `published` in any state. A soft-deleted record keeps its
    /// `deleted_at` and stays in the deleted scope.
    async fn set_published(
        &self,
        kind: &str,
        id: &str,
        published: bool,
    ) -> CatalogResult<VisibleRecord> {
        ensure_owner_id(id)?;
        let kind: VisibleKind = kind.parse()?;

        let mut tx = self.db.begin().await?;
        let mut repo = LifecycleRepository::bind(kind, &mut *tx)?;
        let record = repo.fetch(id).await?;
        repo.set_published(id, published).await?;
        let kind = repo.kind;
        tx.commit().await?;

        let updated = VisibleRecord {
            published,
            ..record
        };
        info!(%kind, id, scope = ?updated.scope(), "visibility changed");
        Ok(updated)
    }

    /// Stamp `deleted_at` with the current time, also on an already deleted
    /// record. The published flag is kept for a later restore.
    pub async fn soft_delete(&self, kind: &str, id: &str) -> CatalogResult<VisibleRecord> {
        ensure_owner_id(id)?;
        let kind: VisibleKind = kind.parse()?;

        let mut tx = self.db.begin().await?;
        let mut repo = LifecycleRepository::bind(kind, &mut *tx)?;
        let record = repo.fetch(id).await?;
        let now = Utc::now();
        repo.set_deleted_at(id, Some(now)).await?;
        let kind = repo.kind;
        tx.commit().await?;

        info!(%kind, id, "soft deleted");
        Ok(VisibleRecord {
            deleted_at: Some(now),
            ..record
        })
    }

    /// Clear `deleted_at`. Restoring a live record changes nothing.
    pub async fn restore(&self, kind: &str, id: &str) -> CatalogResult<VisibleRecord> {
        ensure_owner_id(id)?;
        let kind: VisibleKind = kind.parse()?;

        let mut tx = self.db.begin().await?;
        let mut repo = LifecycleRepository::bind(kind, &mut *tx)?;
        let record = repo.fetch(id).await?;
        if !record.is_deleted() {
            return Ok(record);
        }
        repo.set_deleted_at(id, None).await?;
        let kind = repo.kind;
        tx.commit().await?;

        info!(%kind, id, published = record.published, "restored");
        Ok(VisibleRecord {
            deleted_at: None,
            ..record
        })
    }

    /// Remove a record and its media associations, from any state.
    pub async fn permanent_delete(&self, kind: &str, id: &str) -> CatalogResult<()> {
        ensure_owner_id(id)?;
        let kind: VisibleKind = kind.parse()?;

        let mut tx = self.db.begin().await?;
        let mut repo = LifecycleRepository::bind(kind, &mut *tx)?;
        if repo.purge(id).await? == 0 {
            return Err(repo.not_found(id));
        }
        let kind = repo.kind;
        tx.commit().await?;

        info!(%kind, id, "permanently deleted");
        Ok(())
    }

    pub async fn list_scope(
        &self,
        kind: &str,
        scope: VisibilityScope,
        page: ScopePage,
    ) -> CatalogResult<ScopeListing> {
        if let Some(after) = &page.after {
            ensure_owner_id(after)?;
        }
        let kind: VisibleKind = kind.parse()?;

        let mut tx = self.db.begin().await?;
        let listing = LifecycleRepository::bind(kind, &mut *tx)?
            .list(scope, &page)
            .await?;
        tx.commit().await?;
        Ok(listing)
    }
}
