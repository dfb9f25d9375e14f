//! Media asset references attached to owners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored reference to an asset held by the external media service.
///
/// Rows are written once, the first time an asset is attached anywhere, and
/// never updated afterwards.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct MediaAsset {
    /// Identifier assigned by the media service (primary key).
    #[serde(rename = "mediaServiceID")]
    pub media_service_id: String,

    /// Public delivery URL.
    pub url: String,

    /// HTTPS delivery URL.
    #[serde(rename = "secureURL")]
    pub secure_url: String,

    /// Public id inside the media service's namespace.
    #[serde(rename = "publicID")]
    pub public_id: String,

    /// When this reference was first recorded.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Asset payload supplied by callers of the add operations.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct NewMediaAsset {
    pub url: String,
    #[serde(rename = "secureURL")]
    pub secure_url: String,
    #[serde(rename = "publicID")]
    pub public_id: String,
    #[serde(rename = "mediaServiceID")]
    pub media_service_id: String,
}
