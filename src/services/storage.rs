use crate::config::PresignOperation;
use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::time::Duration;

/// Object storage used by the gallery: one write call and one signing call.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Writes `data` under `key`, tagging the object with `content_type`.
    async fn put_object(&self, key: &str, data: Bytes, content_type: Option<&str>) -> Result<()>;

    /// Mints a URL granting `operation` on `key` for `expires_in`.
    async fn presign_url(
        &self,
        key: &str,
        operation: PresignOperation,
        expires_in: Duration,
    ) -> Result<String>;

    /// Cheap connectivity probe used by the health endpoint.
    async fn is_reachable(&self) -> bool;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn put_object(&self, key: &str, data: Bytes, content_type: Option<&str>) -> Result<()> {
        let res = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .set_content_type(content_type.map(str::to_string))
            .body(ByteStream::from(data))
            .send()
            .await;

        if let Err(e) = res {
            tracing::error!(
                bucket = %self.bucket,
                key = %key,
                error = ?e,
                "S3 put_object failed"
            );
            return Err(e.into());
        }
        Ok(())
    }

    async fn presign_url(
        &self,
        key: &str,
        operation: PresignOperation,
        expires_in: Duration,
    ) -> Result<String> {
        let presigning_config = PresigningConfig::expires_in(expires_in)?;

        // Unlike put_object above, the signed PUT carries no content type:
        // the signature only covers bucket and key.
        let presigned_request = match operation {
            PresignOperation::Put => {
                self.client
                    .put_object()
                    .bucket(&self.bucket)
                    .key(key)
                    .presigned(presigning_config)
                    .await?
            }
            PresignOperation::Get => {
                self.client
                    .get_object()
                    .bucket(&self.bucket)
                    .key(key)
                    .presigned(presigning_config)
                    .await?
            }
        };

        Ok(presigned_request.uri().to_string())
    }

    async fn is_reachable(&self) -> bool {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

    fn offline_service() -> S3StorageService {
        let config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new(
                "AKIDEXAMPLE",
                "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
                None,
                None,
                "static",
            ))
            .endpoint_url("http://127.0.0.1:9000")
            .force_path_style(true)
            .build();

        S3StorageService::new(Client::from_conf(config), "photos".to_string())
    }

    #[tokio::test]
    async fn test_presigned_url_is_valid_for_two_days() {
        let storage = offline_service();
        let url = storage
            .presign_url(
                "uploads/1700000000000-cat.png",
                PresignOperation::Put,
                Duration::from_secs(172_800),
            )
            .await
            .unwrap();

        assert!(url.starts_with("http://127.0.0.1:9000/photos/uploads/1700000000000-cat.png?"));
        assert!(url.contains("X-Amz-Expires=172800"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[tokio::test]
    async fn test_presign_rejects_expiry_beyond_one_week() {
        let storage = offline_service();
        let res = storage
            .presign_url(
                "uploads/1-a.png",
                PresignOperation::Get,
                Duration::from_secs(8 * 24 * 3600),
            )
            .await;

        assert!(res.is_err());
    }

    #[tokio::test]
    async fn test_put_and_get_signatures_differ() {
        let storage = offline_service();
        let ttl = Duration::from_secs(60);
        let put = storage
            .presign_url("uploads/1-a.png", PresignOperation::Put, ttl)
            .await
            .unwrap();
        let get = storage
            .presign_url("uploads/1-a.png", PresignOperation::Get, ttl)
            .await
            .unwrap();

        // The HTTP method is part of the canonical request, so a URL signed
        // for PUT cannot be used to fetch the object.
        let sig = |u: &str| u.split("X-Amz-Signature=").nth(1).map(str::to_string);
        assert_ne!(sig(&put), sig(&get));
    }
}
