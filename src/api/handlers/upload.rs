use crate::api::error::AppError;
use crate::services::gallery_service::NewUpload;
use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub url: String,
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = Multipart, description = "Multipart form with `file` and optional `description`"),
    responses(
        (status = 200, description = "File stored and recorded", body = UploadResponse),
        (status = 400, description = "No file uploaded"),
        (status = 500, description = "Upload failed")
    ),
    tag = "gallery"
)]
pub async fn upload_photo(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload = NewUpload {
        data: None,
        content_type: None,
        filename: String::new(),
        description: None,
    };

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        let err_msg = e.to_string();
        if err_msg.contains("length limit exceeded") {
            AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
        } else {
            AppError::BadRequest(err_msg)
        }
    })? {
        let name = field.name().unwrap_or_default().to_string();

        // A `file` part without a filename is a plain text field, not an upload.
        if name == "file" && field.file_name().is_some() {
            upload.filename = field.file_name().unwrap_or_default().to_string();
            upload.content_type = field.content_type().map(|s| s.to_string());
            upload.data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?,
            );
        } else if name == "description" {
            upload.description = Some(
                field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?,
            );
        }
    }

    let outcome = state
        .gallery_service
        .upload(upload)
        .await
        .map_err(|e| AppError::from_gallery(e, "Upload failed"))?;

    Ok(Json(UploadResponse {
        message: "Upload successful".to_string(),
        url: outcome.access_url,
    }))
}
