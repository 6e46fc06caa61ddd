use crate::api::error::AppError;
use crate::services::gallery_service::GalleryItem;
use axum::{Json, extract::State};

#[utoipa::path(
    get,
    path = "/gallery",
    responses(
        (status = 200, description = "All uploads, most recent first", body = Vec<GalleryItem>),
        (status = 500, description = "Failed to fetch gallery")
    ),
    tag = "gallery"
)]
pub async fn list_gallery(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<GalleryItem>>, AppError> {
    let items = state
        .gallery_service
        .list()
        .await
        .map_err(|e| AppError::from_gallery(e, "Failed to fetch gallery"))?;

    Ok(Json(items))
}
