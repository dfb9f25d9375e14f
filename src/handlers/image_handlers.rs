//! HTTP handlers for attaching and detaching media.

use crate::{
    errors::AppError, models::media::NewMediaAsset, services::catalog_service::CatalogService,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct BatchAddReq {
    #[serde(rename = "ownerIDs")]
    pub owner_ids: Vec<String>,
    pub asset: NewMediaAsset,
}

#[derive(Debug, Deserialize)]
pub struct BatchDeleteReq {
    #[serde(rename = "ownerIDs")]
    pub owner_ids: Vec<String>,
    #[serde(rename = "mediaServiceID")]
    pub media_service_id: String,
}

#[derive(Debug, Serialize)]
pub struct BatchResult {
    #[serde(rename = "ownersAffected")]
    pub owners_affected: usize,
}

/// `POST /owners/{kind}/{id}/images`
pub async fn add_image(
    State(service): State<CatalogService>,
    Path((kind, id)): Path<(String, String)>,
    Json(asset): Json<NewMediaAsset>,
) -> Result<StatusCode, AppError> {
    service.add_image(&kind, &id, &asset).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /owners/{kind}/{id}/images/{media_service_id}`
pub async fn delete_image(
    State(service): State<CatalogService>,
    Path((kind, id, media_service_id)): Path<(String, String, String)>,
) -> Result<StatusCode, AppError> {
    service.delete_image(&kind, &id, &media_service_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /batch/{kind}/images`
pub async fn add_image_batch(
    State(service): State<CatalogService>,
    Path(kind): Path<String>,
    Json(req): Json<BatchAddReq>,
) -> Result<Json<BatchResult>, AppError> {
    let owners_affected = service
        .add_image_batch(&kind, &req.owner_ids, &req.asset)
        .await?;
    Ok(Json(BatchResult { owners_affected }))
}

/// `POST /batch/{kind}/images/delete`
pub async fn delete_image_batch(
    State(service): State<CatalogService>,
    Path(kind): Path<String>,
    Json(req): Json<BatchDeleteReq>,
) -> Result<Json<BatchResult>, AppError> {
    let owners_affected = service
        .delete_image_batch(&kind, &req.owner_ids, &req.media_service_id)
        .await?;
    Ok(Json(BatchResult { owners_affected }))
}
