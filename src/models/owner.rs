//! Owners: catalog entities that can hold media associations.

use crate::{
    models::{media::MediaAsset, visibility::VisibilityColumns},
    services::error::CatalogError,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};

/// Maximum number of media associations an owner may hold.
pub const MAX_IMAGES_PER_OWNER: i64 = 5;

/// Every catalog entity kind that can own media.
///
/// The set is closed: each variant must name its storage layout in
/// [`OwnerKind::table`], so a new kind cannot be routed without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OwnerKind {
    Course,
    Seminar,
    TrainingSession,
    PhysicalGood,
    CoursePart,
}

impl OwnerKind {
    pub const COUNT: usize = 5;

    /// Every kind, in declaration order.
    pub const ALL: [OwnerKind; Self::COUNT] = [
        OwnerKind::Course,
        OwnerKind::Seminar,
        OwnerKind::TrainingSession,
        OwnerKind::PhysicalGood,
        OwnerKind::CoursePart,
    ];

    /// Wire tag used in routes and payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            OwnerKind::Course => "course",
            OwnerKind::Seminar => "seminar",
            OwnerKind::TrainingSession => "training-session",
            OwnerKind::PhysicalGood => "physical-good",
            OwnerKind::CoursePart => "course-part",
        }
    }

    /// Storage layout backing this kind.
    pub fn table(self) -> &'static OwnerTable {
        match self {
            OwnerKind::Course => &COURSES,
            OwnerKind::Seminar => &SEMINARS,
            OwnerKind::TrainingSession => &TRAINING_SESSIONS,
            OwnerKind::PhysicalGood => &PHYSICAL_GOODS,
            OwnerKind::CoursePart => &COURSE_PARTS,
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OwnerKind {
    type Err = CatalogError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        OwnerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| CatalogError::UnknownOwnerType(tag.to_string()))
    }
}

/// Table and column names for one owner kind.
///
/// All names are static identifiers and are interpolated into SQL directly;
/// values are always bound.
#[derive(Debug)]
pub struct OwnerTable {
    pub table: &'static str,
    /// Join table holding one row per (owner, asset) pair.
    pub join_table: &'static str,
    /// Foreign-key column in `join_table` referencing `table.id`.
    pub owner_column: &'static str,
    pub name_column: &'static str,
    pub description_column: &'static str,
    /// Present for kinds with a published/draft/deleted lifecycle.
    pub visibility: Option<VisibilityColumns>,
}

impl OwnerTable {
    /// Predicate excluding soft-deleted rows, empty for kinds without one.
    pub fn live_filter(&self) -> String {
        match &self.visibility {
            Some(cols) => format!(" AND {} IS NULL", cols.deleted_at),
            None => String::new(),
        }
    }
}

static COURSES: OwnerTable = OwnerTable {
    table: "courses",
    join_table: "course_images",
    owner_column: "course_id",
    name_column: "title",
    description_column: "short_description",
    visibility: None,
};

static SEMINARS: OwnerTable = OwnerTable {
    table: "seminars",
    join_table: "seminar_images",
    owner_column: "seminar_id",
    name_column: "name",
    description_column: "short_description",
    visibility: Some(VisibilityColumns::DEFAULT),
};

static TRAINING_SESSIONS: OwnerTable = OwnerTable {
    table: "training_sessions",
    join_table: "training_session_images",
    owner_column: "training_session_id",
    name_column: "title",
    description_column: "summary",
    visibility: None,
};

static PHYSICAL_GOODS: OwnerTable = OwnerTable {
    table: "physical_goods",
    join_table: "physical_good_images",
    owner_column: "physical_good_id",
    name_column: "name",
    description_column: "short_description",
    visibility: None,
};

static COURSE_PARTS: OwnerTable = OwnerTable {
    table: "course_parts",
    join_table: "course_part_images",
    owner_column: "course_part_id",
    name_column: "title",
    description_column: "short_description",
    visibility: Some(VisibilityColumns::DEFAULT),
};

/// The media-relevant projection of an owner row.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Owner {
    pub id: String,

    /// Display name (`title` or `name` depending on the kind).
    pub name: String,

    #[serde(rename = "shortDescription")]
    pub short_description: Option<String>,

    pub published: bool,

    /// Denormalized number of association rows for this owner.
    #[serde(rename = "uploadedCount")]
    pub uploaded_count: i64,
}

/// Payload for creating an owner record.
#[derive(Deserialize, Clone, Debug)]
pub struct NewOwner {
    pub name: String,
    #[serde(default, rename = "shortDescription")]
    pub short_description: Option<String>,
    /// New records are drafts unless stated otherwise.
    #[serde(default)]
    pub published: bool,
}

/// An owner together with the assets currently attached to it.
#[derive(Serialize, Clone, Debug)]
pub struct OwnerWithMedia {
    #[serde(flatten)]
    pub owner: Owner,
    pub media: Vec<MediaAsset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_wire_tag() {
        for kind in OwnerKind::ALL {
            assert_eq!(kind.as_str().parse::<OwnerKind>().unwrap(), kind);
        }
    }

    #[test]
    fn rejects_unknown_tag() {
        let err = "podcast".parse::<OwnerKind>().unwrap_err();
        assert!(matches!(err, CatalogError::UnknownOwnerType(tag) if tag == "podcast"));
    }

    #[test]
    fn only_lifecycle_kinds_filter_deleted_rows() {
        assert_eq!(OwnerKind::Course.table().live_filter(), "");
        assert_eq!(
            OwnerKind::Seminar.table().live_filter(),
            " AND deleted_at IS NULL"
        );
        assert_eq!(
            OwnerKind::CoursePart.table().live_filter(),
            " AND deleted_at IS NULL"
        );
    }
}
