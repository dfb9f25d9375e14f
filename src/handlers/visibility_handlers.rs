//! HTTP handlers for the publish / delete lifecycle and scope listings.

use crate::{
    errors::AppError,
    models::visibility::{ScopePage, VisibilityScope, VisibleRecord},
    services::catalog_service::CatalogService,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    pub scope: Option<String>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub permanent: bool,
}

#[derive(Debug, Serialize)]
pub struct ScopeResponse {
    pub scope: VisibilityScope,
    pub records: Vec<VisibleRecord>,
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// `GET /visibility/{kind}?scope=&limit=&cursor=` — defaults to the public scope.
pub async fn list_scope(
    State(service): State<CatalogService>,
    Path(kind): Path<String>,
    Query(q): Query<ScopeQuery>,
) -> Result<Json<ScopeResponse>, AppError> {
    let scope = match q.scope.as_deref() {
        Some(raw) => raw.parse::<VisibilityScope>()?,
        None => VisibilityScope::Public,
    };
    let after = q.cursor.as_deref().map(decode_cursor).transpose()?;

    let listing = service
        .list_scope(
            &kind,
            scope,
            ScopePage {
                limit: q.limit,
                after,
            },
        )
        .await?;

    Ok(Json(ScopeResponse {
        scope,
        records: listing.records,
        next_cursor: listing.next_after.as_deref().map(encode_cursor),
    }))
}

/// `POST /visibility/{kind}/{id}/publish`
pub async fn publish(
    State(service): State<CatalogService>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<VisibleRecord>, AppError> {
    Ok(Json(service.publish(&kind, &id).await?))
}

/// `POST /visibility/{kind}/{id}/unpublish`
pub async fn unpublish(
    State(service): State<CatalogService>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<VisibleRecord>, AppError> {
    Ok(Json(service.unpublish(&kind, &id).await?))
}

/// `POST /visibility/{kind}/{id}/restore`
pub async fn restore(
    State(service): State<CatalogService>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<VisibleRecord>, AppError> {
    Ok(Json(service.restore(&kind, &id).await?))
}

/// `DELETE /visibility/{kind}/{id}` — soft delete, or purge with `?permanent=true`.
pub async fn delete(
    State(service): State<CatalogService>,
    Path((kind, id)): Path<(String, String)>,
    Query(q): Query<DeleteQuery>,
) -> Result<Response, AppError> {
    if q.permanent {
        service.permanent_delete(&kind, &id).await?;
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let record = service.soft_delete(&kind, &id).await?;
    Ok(Json(record).into_response())
}

fn encode_cursor(id: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(id)
}

fn decode_cursor(cursor: &str) -> Result<String, AppError> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(cursor)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| AppError::bad_request("malformed cursor"))
}
