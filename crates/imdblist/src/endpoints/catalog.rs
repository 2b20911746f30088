use axum::Json;
use axum::extract::{Path, State};

use imdblist_service::types::MediaType;
use imdblist_service::{AddonService, CatalogError, CatalogResponse};

use super::ResponseError;

/// Serves `/catalog/{type}/{id}.json`.
pub async fn serve_catalog(
    State(service): State<AddonService>,
    Path((media_type, id)): Path<(String, String)>,
) -> Result<Json<CatalogResponse>, ResponseError> {
    let media_type = MediaType::parse(&media_type)
        .ok_or_else(|| CatalogError::UnsupportedType(media_type.clone()))?;
    let id = id.strip_suffix(".json").unwrap_or(&id);

    let response = service.catalog(media_type, id).await?;
    Ok(Json(response))
}
