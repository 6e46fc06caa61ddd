//! The upload transaction and the gallery listing.
//!
//! An upload is three independent external calls: write the object, sign a
//! URL for it, insert the metadata row. They run strictly in order and
//! nothing is rolled back when a later step fails, so a signing or insert
//! failure leaves an orphaned object in the bucket.

use crate::config::PresignOperation;
use crate::entities::{photos, prelude::*};
use crate::services::storage::StorageService;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue::NotSet, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

/// Signed URLs are valid for two days from the moment they are minted.
pub const PRESIGNED_URL_TTL_SECS: u64 = 60 * 60 * 24 * 2;

/// Prefix of every object key written by the gallery.
pub const UPLOAD_KEY_PREFIX: &str = "uploads/";

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("{0}")]
    Validation(String),

    #[error("Storage error")]
    Storage(#[source] anyhow::Error),

    #[error("Signing error")]
    Signing(#[source] anyhow::Error),

    #[error("Persistence error")]
    Persistence(#[from] sea_orm::DbErr),
}

/// A file received from the client, fully buffered in memory.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub data: Option<Bytes>,
    pub content_type: Option<String>,
    pub filename: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub access_url: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GalleryItem {
    pub description: Option<String>,
    pub presigned_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<photos::Model> for GalleryItem {
    fn from(model: photos::Model) -> Self {
        Self {
            description: model.description,
            presigned_url: model.presigned_url,
            created_at: model.created_at,
        }
    }
}

/// `uploads/<unix_millis>-<original_filename>`. Two uploads of the same name
/// in the same millisecond map to the same key; the later write wins.
pub fn build_object_key(now: DateTime<Utc>, filename: &str) -> String {
    format!(
        "{}{}-{}",
        UPLOAD_KEY_PREFIX,
        now.timestamp_millis(),
        filename
    )
}

pub struct GalleryService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
    presign_operation: PresignOperation,
}

impl GalleryService {
    pub fn new(
        db: DatabaseConnection,
        storage: Arc<dyn StorageService>,
        presign_operation: PresignOperation,
    ) -> Self {
        Self {
            db,
            storage,
            presign_operation,
        }
    }

    pub async fn upload(&self, upload: NewUpload) -> Result<UploadOutcome, GalleryError> {
        let data = upload
            .data
            .ok_or_else(|| GalleryError::Validation("No file uploaded".to_string()))?;

        let key = build_object_key(Utc::now(), &upload.filename);
        tracing::info!(
            key = %key,
            bytes = data.len(),
            content_type = upload.content_type.as_deref().unwrap_or("-"),
            "Storing upload"
        );

        // 1. Object write
        self.storage
            .put_object(&key, data, upload.content_type.as_deref())
            .await
            .map_err(GalleryError::Storage)?;

        // 2. Signed URL, minted once and stored as-is
        let access_url = self
            .storage
            .presign_url(
                &key,
                self.presign_operation,
                Duration::from_secs(PRESIGNED_URL_TTL_SECS),
            )
            .await
            .map_err(|e| {
                tracing::warn!(key = %key, "Object stored but URL signing failed; object is orphaned");
                GalleryError::Signing(e)
            })?;

        // 3. Metadata row; created_at comes from the column default
        let row = photos::ActiveModel {
            id: NotSet,
            s3_key: Set(key.clone()),
            description: Set(upload.description),
            presigned_url: Set(access_url.clone()),
            created_at: NotSet,
        };
        Photos::insert(row).exec(&self.db).await.map_err(|e| {
            tracing::warn!(key = %key, "Object stored but metadata insert failed; object is orphaned");
            GalleryError::Persistence(e)
        })?;

        tracing::info!(key = %key, "Upload recorded");

        Ok(UploadOutcome { access_url })
    }

    /// Every recorded upload, most recent first.
    pub async fn list(&self) -> Result<Vec<GalleryItem>, GalleryError> {
        let rows = Photos::find()
            .order_by_desc(photos::Column::CreatedAt)
            .order_by_desc(photos::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(GalleryItem::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_object_key_format() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            build_object_key(now, "cat.png"),
            "uploads/1700000000123-cat.png"
        );
    }

    #[test]
    fn test_object_key_keeps_filename_verbatim() {
        let now = Utc.timestamp_millis_opt(5).unwrap();
        assert_eq!(
            build_object_key(now, "my holiday/pic 1.jpg"),
            "uploads/5-my holiday/pic 1.jpg"
        );
    }

    #[test]
    fn test_same_millisecond_same_name_collides() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        assert_eq!(
            build_object_key(now, "a.png"),
            build_object_key(now, "a.png")
        );
    }

    #[test]
    fn test_error_display_leaves_cause_to_source() {
        use std::error::Error;

        let err = GalleryError::Storage(anyhow::anyhow!("AccessDenied"));
        assert_eq!(err.to_string(), "Storage error");
        assert_eq!(err.source().unwrap().to_string(), "AccessDenied");

        let err = GalleryError::Persistence(sea_orm::DbErr::Custom("gone".to_string()));
        assert_eq!(err.to_string(), "Persistence error");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_ttl_is_two_days() {
        assert_eq!(PRESIGNED_URL_TTL_SECS, 172_800);
    }
}
