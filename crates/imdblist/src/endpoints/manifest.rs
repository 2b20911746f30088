use axum::Json;
use axum::extract::State;

use imdblist_service::AddonService;
use imdblist_service::manifest::Manifest;

pub async fn serve_manifest(State(service): State<AddonService>) -> Json<Manifest> {
    Json(service.manifest().clone())
}
