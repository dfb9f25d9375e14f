//! HTTP handlers for owner records.

use crate::{
    errors::AppError,
    models::owner::{NewOwner, Owner, OwnerWithMedia},
    services::{
        catalog_service::CatalogService,
        owner_adapter::{FieldSelector, FieldUpdate, FieldValue},
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

/// One entry of `PATCH /batch/{kind}/fields`.
#[derive(Debug, Deserialize)]
pub struct FieldEdit {
    pub id: String,
    pub field: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FieldEditBatch {
    pub updates: Vec<FieldEdit>,
}

impl FieldEdit {
    fn into_update(self) -> Result<FieldUpdate, AppError> {
        let selector: FieldSelector = self.field.parse()?;
        let value = match selector {
            FieldSelector::Name => FieldValue::Name(
                self.value
                    .ok_or_else(|| AppError::bad_request("`name` requires a value"))?,
            ),
            FieldSelector::ShortDescription => FieldValue::ShortDescription(self.value),
            FieldSelector::UploadedCount => {
                return Err(AppError::bad_request(
                    "`uploaded-count` is maintained by image operations",
                ));
            }
        };
        Ok(FieldUpdate {
            owner_id: self.id,
            value,
        })
    }
}

/// `POST /owners/{kind}` — create an owner record.
pub async fn create_owner(
    State(service): State<CatalogService>,
    Path(kind): Path<String>,
    Json(payload): Json<NewOwner>,
) -> Result<impl IntoResponse, AppError> {
    let owner: Owner = service.create_owner(&kind, payload).await?;
    Ok((StatusCode::CREATED, Json(owner)))
}

/// `GET /owners/{kind}/{id}` — owner and attached media, published or not.
pub async fn get_owner(
    State(service): State<CatalogService>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<OwnerWithMedia>, AppError> {
    Ok(Json(service.get_owner(&kind, &id).await?))
}

/// `PATCH /batch/{kind}/fields` — per-owner name or description edits.
pub async fn update_fields(
    State(service): State<CatalogService>,
    Path(kind): Path<String>,
    Json(payload): Json<FieldEditBatch>,
) -> Result<impl IntoResponse, AppError> {
    let updates = payload
        .updates
        .into_iter()
        .map(FieldEdit::into_update)
        .collect::<Result<Vec<_>, _>>()?;
    let updated = service.update_owner_fields(&kind, updates).await?;
    Ok(Json(json!({ "updated": updated })))
}
