use crate::models::owner::OwnerKind;
use thiserror::Error;

/// Failure kinds surfaced by the catalog services.
///
/// Domain variants are distinct so callers branch on the variant, never on
/// the message. `Internal` keeps the storage error as its source for logs but
/// renders a fixed message.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unknown owner type `{0}`")]
    UnknownOwnerType(String),
    #[error("{0} has no visibility lifecycle")]
    VisibilityUnsupported(OwnerKind),
    #[error("{kind} `{id}` not found")]
    OwnerNotFound { kind: OwnerKind, id: String },
    #[error("none of the requested {0} owners exist")]
    OwnersNotFound(OwnerKind),
    #[error("{kind} `{id}` already holds the maximum of {limit} images")]
    ImageLimitExceeded {
        kind: OwnerKind,
        id: String,
        limit: i64,
    },
    #[error("image `{media_service_id}` is not attached to {kind} `{id}`")]
    ImageNotFoundOnOwner {
        kind: OwnerKind,
        id: String,
        media_service_id: String,
    },
    #[error("image `{media_service_id}` is already attached to {kind} `{id}`")]
    ImageAlreadyAttached {
        kind: OwnerKind,
        id: String,
        media_service_id: String,
    },
    #[error("image `{0}` is not attached to any of the requested owners")]
    AssociationsNotFound(String),
    #[error("field batch mixes `{first}` and `{other}` updates")]
    HeterogeneousBatch {
        first: &'static str,
        other: &'static str,
    },
    #[error("{kind} `{id}` not found")]
    RecordNotFound { kind: OwnerKind, id: String },
    #[error("{kind} image counters changed concurrently")]
    ConcurrentUpdate { kind: OwnerKind },
    #[error("internal storage error")]
    Internal(#[source] sqlx::Error),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::Internal(err)
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
