pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;

use crate::config::AppConfig;
use crate::services::gallery_service::GalleryService;
use crate::services::storage::StorageService;
use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upload::upload_photo,
        api::handlers::gallery::list_gallery,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::upload::UploadResponse,
            api::handlers::health::HealthResponse,
            services::gallery_service::GalleryItem,
        )
    ),
    tags(
        (name = "gallery", description = "Photo upload and listing"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

/// Long-lived clients shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageService>,
    pub gallery_service: Arc<GalleryService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: DatabaseConnection, storage: Arc<dyn StorageService>, config: AppConfig) -> Self {
        let gallery_service = Arc::new(GalleryService::new(
            db.clone(),
            storage.clone(),
            config.presign_operation,
        ));

        Self {
            db,
            storage,
            gallery_service,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/upload", post(api::handlers::upload::upload_photo))
        .route("/gallery", get(api::handlers::gallery::list_gallery))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_file_size,
        ))
        .with_state(state)
}
