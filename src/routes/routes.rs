//! Defines routes for owner records, media associations and visibility.
//!
//! ## Structure
//! - **Owner endpoints**
//!   - `POST   /owners/{kind}` — create owner
//!   - `GET    /owners/{kind}/{id}` — owner with attached media
//!
//! - **Media endpoints**
//!   - `POST   /owners/{kind}/{id}/images` — attach one asset
//!   - `DELETE /owners/{kind}/{id}/images/{media_service_id}` — detach one asset
//!
//! - **Batch endpoints** (kept off `/owners` so any owner id stays routable)
//!   - `PATCH  /batch/{kind}/fields` — name/description edits
//!   - `POST   /batch/{kind}/images` — attach one asset to many owners
//!   - `POST   /batch/{kind}/images/delete` — detach one asset from many owners
//!
//! - **Visibility endpoints** (seminar, course-part)
//!   - `GET    /visibility/{kind}` — list a scope (`?scope=public|draft|deleted`)
//!   - `POST   /visibility/{kind}/{id}/publish|unpublish|restore`
//!   - `DELETE /visibility/{kind}/{id}` — soft delete (`?permanent=true` purges)

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        image_handlers::{add_image, add_image_batch, delete_image, delete_image_batch},
        owner_handlers::{create_owner, get_owner, update_fields},
        visibility_handlers::{delete, list_scope, publish, restore, unpublish},
    },
    services::catalog_service::CatalogService,
};
use axum::{
    Router,
    routing::{delete as delete_route, get, patch, post},
};

/// Build the router for every catalog route.
///
/// The router carries shared state (`CatalogService`) to all handlers.
pub fn routes() -> Router<CatalogService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Owner routes
        .route("/owners/{kind}", post(create_owner))
        .route("/owners/{kind}/{id}", get(get_owner))
        // Media routes
        .route("/owners/{kind}/{id}/images", post(add_image))
        .route(
            "/owners/{kind}/{id}/images/{media_service_id}",
            delete_route(delete_image),
        )
        // Batch routes
        .route("/batch/{kind}/fields", patch(update_fields))
        .route("/batch/{kind}/images", post(add_image_batch))
        .route("/batch/{kind}/images/delete", post(delete_image_batch))
        // Visibility routes
        .route("/visibility/{kind}", get(list_scope))
        .route("/visibility/{kind}/{id}", delete_route(delete))
        .route("/visibility/{kind}/{id}/publish", post(publish))
        .route("/visibility/{kind}/{id}/unpublish", post(unpublish))
        .route("/visibility/{kind}/{id}/restore", post(restore))
}
