//! Input checks applied before any storage access.

use crate::{
    models::media::NewMediaAsset,
    services::error::{CatalogError, CatalogResult},
};
use std::collections::HashSet;
use url::Url;

const MAX_OWNER_ID_LEN: usize = 64;
const MAX_MEDIA_SERVICE_ID_LEN: usize = 255;
const MAX_PUBLIC_ID_LEN: usize = 255;
const MAX_URL_LEN: usize = 2048;
const MAX_NAME_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// Upper bound on distinct owner ids in one batch request.
pub const MAX_BATCH_OWNERS: usize = 500;

fn invalid(msg: impl Into<String>) -> CatalogError {
    CatalogError::InvalidArgument(msg.into())
}

fn has_control_chars(value: &str) -> bool {
    value.chars().any(|c| c.is_control())
}

/// Owner ids are opaque but must be non-empty, bounded and printable.
pub fn ensure_owner_id(id: &str) -> CatalogResult<()> {
    if id.is_empty() {
        return Err(invalid("owner id is empty"));
    }
    if id.len() > MAX_OWNER_ID_LEN {
        return Err(invalid(format!(
            "owner id exceeds {MAX_OWNER_ID_LEN} bytes"
        )));
    }
    if has_control_chars(id) {
        return Err(invalid("owner id contains control characters"));
    }
    Ok(())
}

/// Validate a batch id list and collapse duplicates, keeping first-seen order.
pub fn normalize_owner_ids(ids: &[String]) -> CatalogResult<Vec<String>> {
    if ids.is_empty() {
        return Err(invalid("owner id list is empty"));
    }

    let mut seen = HashSet::with_capacity(ids.len());
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        ensure_owner_id(id)?;
        if seen.insert(id.as_str()) {
            unique.push(id.clone());
        }
    }

    ensure_batch_size(unique.len())?;
    Ok(unique)
}

/// Reject batches naming more than [`MAX_BATCH_OWNERS`] distinct owners.
pub fn ensure_batch_size(distinct_owners: usize) -> CatalogResult<()> {
    if distinct_owners > MAX_BATCH_OWNERS {
        return Err(invalid(format!(
            "batch names {distinct_owners} owners, at most {MAX_BATCH_OWNERS} are allowed"
        )));
    }
    Ok(())
}

pub fn ensure_media_service_id(id: &str) -> CatalogResult<()> {
    if id.trim().is_empty() {
        return Err(invalid("mediaServiceID is empty"));
    }
    if id.len() > MAX_MEDIA_SERVICE_ID_LEN {
        return Err(invalid(format!(
            "mediaServiceID exceeds {MAX_MEDIA_SERVICE_ID_LEN} bytes"
        )));
    }
    if has_control_chars(id) {
        return Err(invalid("mediaServiceID contains control characters"));
    }
    Ok(())
}

fn ensure_web_url(field: &str, value: &str, require_https: bool) -> CatalogResult<()> {
    if value.len() > MAX_URL_LEN {
        return Err(invalid(format!("{field} exceeds {MAX_URL_LEN} bytes")));
    }
    let parsed = Url::parse(value).map_err(|err| invalid(format!("{field} is not a URL: {err}")))?;
    match parsed.scheme() {
        "https" => Ok(()),
        "http" if !require_https => Ok(()),
        scheme => Err(invalid(format!("{field} has unsupported scheme `{scheme}`"))),
    }
}

/// Shape checks only. The media service owns asset existence.
pub fn ensure_asset(asset: &NewMediaAsset) -> CatalogResult<()> {
    ensure_media_service_id(&asset.media_service_id)?;
    ensure_web_url("url", &asset.url, false)?;
    ensure_web_url("secureURL", &asset.secure_url, true)?;
    if asset.public_id.trim().is_empty() {
        return Err(invalid("publicID is empty"));
    }
    if asset.public_id.len() > MAX_PUBLIC_ID_LEN {
        return Err(invalid(format!(
            "publicID exceeds {MAX_PUBLIC_ID_LEN} bytes"
        )));
    }
    Ok(())
}

pub fn ensure_owner_name(name: &str) -> CatalogResult<()> {
    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid(format!("name exceeds {MAX_NAME_LEN} bytes")));
    }
    Ok(())
}

pub fn ensure_description(text: &str) -> CatalogResult<()> {
    if text.len() > MAX_DESCRIPTION_LEN {
        return Err(invalid(format!(
            "short description exceeds {MAX_DESCRIPTION_LEN} bytes"
        )));
    }
    Ok(())
}
