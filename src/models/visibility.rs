//! Published / draft / soft-deleted lifecycle.
//!
//! Visibility is derived from two independent columns: a `published` flag and
//! a nullable `deleted_at` timestamp. Soft deletion freezes `published`, so a
//! restored record comes back in whichever state it held before.

use crate::{models::owner::OwnerKind, services::error::CatalogError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// Column pair driving the lifecycle of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityColumns {
    pub published: &'static str,
    pub deleted_at: &'static str,
}

impl VisibilityColumns {
    pub const DEFAULT: VisibilityColumns = VisibilityColumns {
        published: "published",
        deleted_at: "deleted_at",
    };
}

/// The three read scopes over a lifecycle-managed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityScope {
    /// `published = true` and not deleted.
    Public,
    /// `published = false` and not deleted.
    Draft,
    /// Deleted, whatever `published` holds.
    Deleted,
}

impl VisibilityScope {
    /// SQL predicate selecting this scope for the given columns.
    pub fn predicate(self, cols: VisibilityColumns) -> String {
        match self {
            VisibilityScope::Public => {
                format!("{} = 1 AND {} IS NULL", cols.published, cols.deleted_at)
            }
            VisibilityScope::Draft => {
                format!("{} = 0 AND {} IS NULL", cols.published, cols.deleted_at)
            }
            VisibilityScope::Deleted => format!("{} IS NOT NULL", cols.deleted_at),
        }
    }

    /// Scope a row with these field values belongs to.
    pub fn of(published: bool, deleted_at: Option<DateTime<Utc>>) -> Self {
        match (published, deleted_at) {
            (_, Some(_)) => VisibilityScope::Deleted,
            (true, None) => VisibilityScope::Public,
            (false, None) => VisibilityScope::Draft,
        }
    }
}

impl FromStr for VisibilityScope {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" | "published" => Ok(VisibilityScope::Public),
            "draft" | "unpublished" => Ok(VisibilityScope::Draft),
            "deleted" => Ok(VisibilityScope::Deleted),
            other => Err(CatalogError::InvalidArgument(format!(
                "unknown visibility scope `{other}`"
            ))),
        }
    }
}

/// Owner kinds that carry the lifecycle columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleKind {
    Seminar,
    CoursePart,
}

impl VisibleKind {
    pub fn owner_kind(self) -> OwnerKind {
        match self {
            VisibleKind::Seminar => OwnerKind::Seminar,
            VisibleKind::CoursePart => OwnerKind::CoursePart,
        }
    }
}

impl TryFrom<OwnerKind> for VisibleKind {
    type Error = CatalogError;

    fn try_from(kind: OwnerKind) -> Result<Self, Self::Error> {
        match kind {
            OwnerKind::Seminar => Ok(VisibleKind::Seminar),
            OwnerKind::CoursePart => Ok(VisibleKind::CoursePart),
            OwnerKind::Course | OwnerKind::TrainingSession | OwnerKind::PhysicalGood => {
                Err(CatalogError::VisibilityUnsupported(kind))
            }
        }
    }
}

impl FromStr for VisibleKind {
    type Err = CatalogError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        tag.parse::<OwnerKind>()?.try_into()
    }
}

/// Lifecycle view of a seminar or course part.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct VisibleRecord {
    pub id: String,
    pub name: String,
    pub published: bool,
    #[serde(rename = "deletedAt")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl VisibleRecord {
    pub fn scope(&self) -> VisibilityScope {
        VisibilityScope::of(self.published, self.deleted_at)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Keyset page request over one scope.
#[derive(Debug, Clone, Default)]
pub struct ScopePage {
    pub limit: Option<usize>,
    /// Return rows with ids strictly greater than this one.
    pub after: Option<String>,
}

/// One page of records from a scope.
#[derive(Debug, Clone)]
pub struct ScopeListing {
    pub records: Vec<VisibleRecord>,
    /// Id of the last returned record when more rows follow.
    pub next_after: Option<String>,
}
